use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::domain::repository::{
    ArtifactPort, CodeMint, InsertTeamError, MailDelivery, MailPort, TeamRepository,
};
use crate::domain::types::{
    CODE_RETRY_BUDGET, MemberRecord, RegistrationPayload, TeamRecord, TeamWithMembers,
};
use crate::error::EventServiceError;
use crate::mint;
use crate::otp::{OtpStore, OtpVerify};
use crate::pending::PendingStore;

pub struct VerifyOtpInput {
    pub leader_email: String,
    pub otp: String,
}

pub struct VerifyOtpOutput {
    pub team: TeamWithMembers,
    /// True when the post-commit pipeline (cards or mail) failed; the team
    /// is committed regardless and the cards are regenerated on demand.
    pub artifacts_deferred: bool,
}

/// Phase two of registration: consume the OTP, commit the team with freshly
/// minted identifiers, then run the artifact/mail pipeline.
pub struct VerifyOtpUseCase<R, M, A, C>
where
    R: TeamRepository,
    M: MailPort,
    A: ArtifactPort,
    C: CodeMint,
{
    pub teams: R,
    pub mailer: M,
    pub artifacts: A,
    pub mint: C,
    pub otp: Arc<OtpStore>,
    pub pending: Arc<PendingStore>,
    pub clock: Arc<dyn Clock>,
    pub team_id_prefix: String,
}

impl<R, M, A, C> VerifyOtpUseCase<R, M, A, C>
where
    R: TeamRepository,
    M: MailPort,
    A: ArtifactPort,
    C: CodeMint,
{
    pub async fn execute(&self, input: VerifyOtpInput) -> Result<VerifyOtpOutput, EventServiceError> {
        let email = input.leader_email.trim().to_lowercase();

        match self.otp.verify(&email, &input.otp) {
            OtpVerify::Verified => {}
            OtpVerify::Invalid { attempts_left } => {
                return Err(EventServiceError::OtpInvalid { attempts_left });
            }
            OtpVerify::Expired => return Err(EventServiceError::OtpExpired),
            OtpVerify::RateLimited { retry_after_secs } => {
                return Err(EventServiceError::RateLimited { retry_after_secs });
            }
        }

        // Atomic read-remove: between two racing verifications exactly one
        // caller gets the payload, the other sees an expired registration.
        let payload = self
            .pending
            .take(&email)
            .ok_or(EventServiceError::RegistrationExpired)?;

        let committed = self.commit(payload).await?;
        info!(team_id = %committed.team.team_id, "team committed");

        let artifacts_deferred = self.deliver_artifacts(&committed).await;

        // Belt and braces: both stores must be empty for this email now.
        self.otp.remove(&email);
        self.pending.remove(&email);

        Ok(VerifyOtpOutput {
            team: committed,
            artifacts_deferred,
        })
    }

    /// Mint identifiers and insert, re-minting on identifier collisions up
    /// to the retry budget. An email conflict is final.
    async fn commit(
        &self,
        payload: RegistrationPayload,
    ) -> Result<TeamWithMembers, EventServiceError> {
        for attempt in 0..CODE_RETRY_BUDGET {
            let seq = self.teams.next_sequence().await?;
            let team_code = self.mint.team_code();
            let now = self.clock.now();

            let team = TeamRecord {
                id: Uuid::new_v4(),
                team_id: mint::team_id(&self.team_id_prefix, seq),
                team_code: team_code.clone(),
                team_name: payload.team_name.clone(),
                leader_name: payload.leader_name.clone(),
                leader_email: payload.leader_email.clone(),
                leader_phone: payload.leader_phone.clone(),
                college_name: payload.college_name.clone(),
                year: payload.year.clone(),
                domain: payload.domain.clone(),
                access_key: self.mint.access_key(),
                attendance_status: false,
                check_in_time: None,
                created_at: now,
            };
            let members: Vec<MemberRecord> = payload
                .team_members
                .iter()
                .enumerate()
                .map(|(index, member)| MemberRecord {
                    id: Uuid::new_v4(),
                    member_index: index as i32,
                    name: member.name.clone(),
                    email: member.email.clone(),
                    phone: member.phone.clone(),
                    participant_id: mint::participant_id(&team_code, index),
                    is_team_leader: index == 0,
                })
                .collect();

            match self.teams.insert_team(&team, &members).await {
                Ok(()) => return Ok(TeamWithMembers { team, members }),
                Err(InsertTeamError::DuplicateEmail) => {
                    return Err(EventServiceError::EmailAlreadyRegistered);
                }
                Err(InsertTeamError::DuplicateCode | InsertTeamError::DuplicateTeamId) => {
                    debug!(attempt, "identifier collision; re-minting");
                }
                Err(InsertTeamError::Db(e)) => return Err(EventServiceError::Internal(e)),
            }
        }
        Err(EventServiceError::Internal(anyhow::anyhow!(
            "exhausted identifier retry budget ({CODE_RETRY_BUDGET})"
        )))
    }

    /// Post-commit pipeline. Failures degrade to deferred delivery and
    /// never unwind the commit.
    async fn deliver_artifacts(&self, committed: &TeamWithMembers) -> bool {
        let document = match self
            .artifacts
            .generate_id_cards(&committed.team, &committed.members)
            .await
        {
            Ok(path) => path,
            Err(e) => {
                warn!(
                    team_id = %committed.team.team_id,
                    error = %format!("{e:#}"),
                    "card generation failed; delivery deferred"
                );
                return true;
            }
        };

        let deferred = match self
            .mailer
            .send_confirmation(&committed.team, &committed.members, &document)
            .await
        {
            MailDelivery::Sent | MailDelivery::Queued => false,
            MailDelivery::Unconfigured | MailDelivery::Rejected => {
                warn!(
                    team_id = %committed.team.team_id,
                    "confirmation mail not delivered; cards available on demand"
                );
                true
            }
        };

        // The attachment was read into the message; the intermediate file
        // is no longer needed on any path.
        if let Err(e) = tokio::fs::remove_file(&document).await {
            debug!(error = %e, path = %document.display(), "temp document already gone");
        }

        deferred
    }
}

use std::sync::Arc;

use tracing::info;

use crate::domain::repository::{MailDelivery, MailPort, TeamRepository};
use crate::domain::types::RegistrationPayload;
use crate::error::EventServiceError;
use crate::otp::{OtpIssue, OtpStore};
use crate::pending::PendingStore;

pub struct RegisterOutput {
    pub message: String,
    pub expires_in_secs: u64,
    /// The minted code, echoed only when the mailer is unconfigured and the
    /// service runs under the explicit development policy.
    pub dev_otp: Option<String>,
}

/// Phase one of registration: park the validated payload, mint an OTP and
/// attempt delivery. Nothing is committed here.
pub struct RegisterUseCase<R: TeamRepository, M: MailPort> {
    pub teams: R,
    pub mailer: M,
    pub otp: Arc<OtpStore>,
    pub pending: Arc<PendingStore>,
    pub dev_mode: bool,
    pub max_team_size: usize,
}

impl<R: TeamRepository, M: MailPort> RegisterUseCase<R, M> {
    pub async fn execute(
        &self,
        mut payload: RegistrationPayload,
    ) -> Result<RegisterOutput, EventServiceError> {
        if payload.team_members.len() > self.max_team_size {
            return Err(EventServiceError::BadRequest(format!(
                "a team may have at most {} members",
                self.max_team_size
            )));
        }

        payload.leader_email = payload.leader_email.trim().to_lowercase();
        if let Some(leader) = payload.team_members.first_mut() {
            leader.email = leader.email.trim().to_lowercase();
        }
        let email = payload.leader_email.clone();

        if self.teams.find_by_leader_email(&email).await?.is_some() {
            return Err(EventServiceError::EmailAlreadyRegistered);
        }

        // Replace any earlier pending payload for this email; a fresh OTP
        // follows.
        self.pending.put(&email, payload);

        let (code, expires_in_secs) = match self.otp.issue(&email) {
            OtpIssue::Issued {
                code,
                expires_in_secs,
            } => (code, expires_in_secs),
            OtpIssue::RateLimited { retry_after_secs } => {
                return Err(EventServiceError::RateLimited { retry_after_secs });
            }
        };

        match self.mailer.send_otp(&email, &code, expires_in_secs).await {
            MailDelivery::Sent | MailDelivery::Queued => {
                info!(email = %email, "OTP issued and handed to the mailer");
                Ok(RegisterOutput {
                    message: format!(
                        "OTP sent to {email}; check your inbox. It expires in {} minutes.",
                        expires_in_secs / 60
                    ),
                    expires_in_secs,
                    dev_otp: None,
                })
            }
            MailDelivery::Unconfigured if self.dev_mode => Ok(RegisterOutput {
                message: "mail transport unconfigured; OTP echoed for development only".to_owned(),
                expires_in_secs,
                dev_otp: Some(code),
            }),
            MailDelivery::Unconfigured => Err(EventServiceError::Unconfigured),
            MailDelivery::Rejected => Err(EventServiceError::Internal(anyhow::anyhow!(
                "OTP delivery rejected for {email}"
            ))),
        }
    }
}

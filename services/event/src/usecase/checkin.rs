use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::clock::Clock;
use crate::domain::repository::TeamRepository;
use crate::domain::types::{CheckInOutcome, MemberRecord, ScanPayload, TeamWithMembers};
use crate::error::EventServiceError;
use crate::events::{CheckInEvent, EventBus};
use crate::mint;

pub struct CheckInContext {
    pub team: TeamWithMembers,
    /// Scan mode: the member the scanned card belongs to. Manual mode: the
    /// team leader.
    pub participant: MemberRecord,
    pub checked_in_at: DateTime<Utc>,
}

/// Attendance transitions from a scanned QR payload or a typed team id.
/// Concurrent scans are serialised by the store's conditional update.
pub struct CheckInUseCase<R: TeamRepository> {
    pub teams: R,
    pub events: EventBus,
    pub clock: Arc<dyn Clock>,
}

impl<R: TeamRepository> CheckInUseCase<R> {
    /// QR mode: `raw` is the UTF-8 JSON string lifted from the code.
    pub async fn scan(&self, raw: &str) -> Result<CheckInContext, EventServiceError> {
        let payload: ScanPayload = serde_json::from_str(raw)
            .map_err(|e| EventServiceError::InvalidPayload(e.to_string()))?;

        let found = self
            .teams
            .find_by_team_code(&payload.team_code)
            .await?
            .ok_or(EventServiceError::TeamNotFound)?;

        let participant = found
            .members
            .iter()
            .find(|m| m.participant_id == payload.participant_id)
            .cloned()
            .ok_or_else(|| {
                EventServiceError::InvalidPayload(format!(
                    "participant {} does not belong to team {}",
                    payload.participant_id, payload.team_code
                ))
            })?;

        self.transition(found, participant).await
    }

    /// Manual mode: a volunteer typed the public team id.
    pub async fn manual(&self, team_id: &str) -> Result<CheckInContext, EventServiceError> {
        let team_id = team_id.trim();
        if !mint::is_team_id_shape(team_id) {
            return Err(EventServiceError::BadRequest(format!(
                "malformed team id: {team_id}"
            )));
        }

        let found = self
            .teams
            .find_by_team_id(team_id)
            .await?
            .ok_or(EventServiceError::TeamNotFound)?;
        let leader = found
            .leader()
            .cloned()
            .ok_or_else(|| EventServiceError::Internal(anyhow::anyhow!("team has no leader row")))?;

        self.transition(found, leader).await
    }

    async fn transition(
        &self,
        mut found: TeamWithMembers,
        participant: MemberRecord,
    ) -> Result<CheckInContext, EventServiceError> {
        let when = self.clock.now();
        match self
            .teams
            .mark_checked_in(&found.team.team_code, when)
            .await?
        {
            CheckInOutcome::CheckedIn { at } => {
                found.team.attendance_status = true;
                found.team.check_in_time = Some(at);
                info!(team_id = %found.team.team_id, "team checked in");
                self.events.publish(CheckInEvent {
                    team_id: found.team.team_id.clone(),
                    team_code: found.team.team_code.clone(),
                    team_name: found.team.team_name.clone(),
                    participant_id: participant.participant_id.clone(),
                    checked_in_at: at,
                });
                Ok(CheckInContext {
                    team: found,
                    participant,
                    checked_in_at: at,
                })
            }
            CheckInOutcome::AlreadyCheckedIn { at } => {
                Err(EventServiceError::AlreadyCheckedIn { checked_in_at: at })
            }
            // The team vanished between resolve and update; treat as a miss.
            CheckInOutcome::NotFound => Err(EventServiceError::TeamNotFound),
        }
    }
}

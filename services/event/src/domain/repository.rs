#![allow(async_fn_in_trait)]

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::domain::types::{
    CheckInOutcome, EventStats, MemberRecord, TeamRecord, TeamWithMembers,
};
use crate::error::EventServiceError;

/// Insert failures the orchestrator must tell apart: an email conflict is
/// final (409), an identifier conflict is re-mintable.
#[derive(Debug, thiserror::Error)]
pub enum InsertTeamError {
    #[error("leader email already registered")]
    DuplicateEmail,
    #[error("team code collision")]
    DuplicateCode,
    #[error("team id collision")]
    DuplicateTeamId,
    #[error(transparent)]
    Db(anyhow::Error),
}

/// Repository for committed teams and their members.
pub trait TeamRepository: Send + Sync {
    /// Next registration ordinal (count of committed teams + 1). Racy by
    /// design; the unique index on `team_id` rejects the loser, which
    /// re-reads and retries.
    async fn next_sequence(&self) -> Result<u64, EventServiceError>;

    async fn find_by_leader_email(
        &self,
        email: &str,
    ) -> Result<Option<TeamWithMembers>, EventServiceError>;

    async fn find_by_team_code(
        &self,
        team_code: &str,
    ) -> Result<Option<TeamWithMembers>, EventServiceError>;

    async fn find_by_team_id(
        &self,
        team_id: &str,
    ) -> Result<Option<TeamWithMembers>, EventServiceError>;

    /// Insert the team and all members in one transaction.
    async fn insert_team(
        &self,
        team: &TeamRecord,
        members: &[MemberRecord],
    ) -> Result<(), InsertTeamError>;

    /// Conditional attendance transition: flips `attendance_status` only if
    /// currently false. Exactly one concurrent caller wins.
    async fn mark_checked_in(
        &self,
        team_code: &str,
        when: DateTime<Utc>,
    ) -> Result<CheckInOutcome, EventServiceError>;

    async fn stats(&self) -> Result<EventStats, EventServiceError>;
}

/// Source of the random identifiers minted at commit time. A port so the
/// collision-retry path is observable in tests.
pub trait CodeMint: Send + Sync {
    fn team_code(&self) -> String;
    fn access_key(&self) -> String;
}

/// What became of a mail handed to the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailDelivery {
    /// Accepted by the relay within the wait budget.
    Sent,
    /// Still in flight; a background task keeps retrying.
    Queued,
    /// SMTP settings are missing; nothing was attempted.
    Unconfigured,
    /// Permanently refused (bad recipient, auth failure, retries exhausted).
    Rejected,
}

/// Outbound mail port.
pub trait MailPort: Send + Sync {
    async fn send_otp(&self, to: &str, code: &str, expires_in_secs: u64) -> MailDelivery;

    async fn send_confirmation(
        &self,
        team: &TeamRecord,
        members: &[MemberRecord],
        document: &Path,
    ) -> MailDelivery;
}

/// Card rendering + document assembly port. Failures here never undo a
/// committed team; callers degrade to deferred delivery.
pub trait ArtifactPort: Send + Sync {
    async fn generate_id_cards(
        &self,
        team: &TeamRecord,
        members: &[MemberRecord],
    ) -> anyhow::Result<PathBuf>;
}

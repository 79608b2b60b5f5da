use anyhow::Context as _;
use subtle::ConstantTimeEq;

use crate::domain::repository::{ArtifactPort, TeamRepository};
use crate::domain::types::{EventStats, TeamWithMembers};
use crate::error::EventServiceError;

/// Read-only team lookups.
pub struct GetTeamUseCase<R: TeamRepository> {
    pub teams: R,
}

impl<R: TeamRepository> GetTeamUseCase<R> {
    pub async fn by_code(&self, team_code: &str) -> Result<TeamWithMembers, EventServiceError> {
        self.teams
            .find_by_team_code(team_code)
            .await?
            .ok_or(EventServiceError::TeamNotFound)
    }

    pub async fn by_id(&self, team_id: &str) -> Result<TeamWithMembers, EventServiceError> {
        self.teams
            .find_by_team_id(team_id)
            .await?
            .ok_or(EventServiceError::TeamNotFound)
    }
}

pub struct StatsUseCase<R: TeamRepository> {
    pub teams: R,
}

impl<R: TeamRepository> StatsUseCase<R> {
    pub async fn execute(&self) -> Result<EventStats, EventServiceError> {
        self.teams.stats().await
    }
}

pub struct DownloadOutput {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Self-service re-download of the card document, authorised by the team's
/// access key. The document is regenerated on demand and not kept around.
pub struct DownloadCardsUseCase<R: TeamRepository, A: ArtifactPort> {
    pub teams: R,
    pub artifacts: A,
}

impl<R: TeamRepository, A: ArtifactPort> DownloadCardsUseCase<R, A> {
    pub async fn execute(
        &self,
        team_id: &str,
        access_key: &str,
    ) -> Result<DownloadOutput, EventServiceError> {
        let found = self
            .teams
            .find_by_team_id(team_id)
            .await?
            .ok_or(EventServiceError::TeamNotFound)?;

        let matches: bool = found
            .team
            .access_key
            .as_bytes()
            .ct_eq(access_key.as_bytes())
            .into();
        if !matches {
            return Err(EventServiceError::InvalidAccessKey);
        }

        let path = self
            .artifacts
            .generate_id_cards(&found.team, &found.members)
            .await
            .context("regenerate cards for download")?;
        let bytes = tokio::fs::read(&path)
            .await
            .context("read regenerated document")?;
        tokio::fs::remove_file(&path).await.ok();

        Ok(DownloadOutput {
            filename: format!("{}_id_cards.pdf", found.team.team_id),
            bytes,
        })
    }
}

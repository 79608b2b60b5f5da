pub mod document;
pub mod quotes;
pub mod renderer;

use std::path::PathBuf;

use anyhow::Context as _;
use chrono::Utc;

use crate::config::EventConfig;
use crate::domain::repository::ArtifactPort;
use crate::domain::types::{MemberRecord, TeamRecord};
use renderer::CardRenderer;

/// Card pipeline facade: renders one card per member and assembles them
/// into the team's document. Rendering is CPU-bound and runs on the
/// blocking pool. Fonts are loaded per run so a missing font surfaces as a
/// reported render failure, not a startup crash.
#[derive(Clone)]
pub struct CardService {
    font_dir: PathBuf,
    assets_dir: PathBuf,
    banner: String,
    event_title: String,
}

impl CardService {
    pub fn from_config(cfg: &EventConfig) -> Self {
        Self {
            font_dir: PathBuf::from(&cfg.font_dir),
            assets_dir: PathBuf::from(&cfg.assets_dir),
            banner: cfg.event_banner.clone(),
            event_title: cfg.event_title.clone(),
        }
    }

    /// Path the assembled document lands at, derivable from the team id.
    pub fn document_path(&self, team_id: &str) -> PathBuf {
        self.assets_dir.join(format!("{team_id}_id_cards.pdf"))
    }

    fn generate_blocking(
        &self,
        team: &TeamRecord,
        members: &[MemberRecord],
    ) -> anyhow::Result<PathBuf> {
        let renderer = CardRenderer::new(
            &self.font_dir,
            self.banner.clone(),
            self.event_title.clone(),
        )?;
        let issued_at = Utc::now();
        let cards = members
            .iter()
            .map(|member| renderer.render_card(team, member, None, issued_at))
            .collect::<anyhow::Result<Vec<_>>>()?;
        let path = self.document_path(&team.team_id);
        document::assemble(cards, &team.team_id, &path)?;
        Ok(path)
    }
}

impl ArtifactPort for CardService {
    async fn generate_id_cards(
        &self,
        team: &TeamRecord,
        members: &[MemberRecord],
    ) -> anyhow::Result<PathBuf> {
        let service = self.clone();
        let team = team.clone();
        let members = members.to_vec();
        tokio::task::spawn_blocking(move || service.generate_blocking(&team, &members))
            .await
            .context("card render task aborted")?
    }
}

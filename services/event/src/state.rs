use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::cards::CardService;
use crate::clock::Clock;
use crate::events::EventBus;
use crate::infra::db::DbTeamRepository;
use crate::mailer::SmtpMailer;
use crate::otp::OtpStore;
use crate::pending::PendingStore;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub otp: Arc<OtpStore>,
    pub pending: Arc<PendingStore>,
    pub clock: Arc<dyn Clock>,
    pub mailer: SmtpMailer,
    pub cards: CardService,
    pub events: EventBus,
    pub dev_mode: bool,
    pub team_id_prefix: String,
    pub max_team_size: usize,
}

impl AppState {
    pub fn team_repo(&self) -> DbTeamRepository {
        DbTeamRepository {
            db: self.db.clone(),
        }
    }
}

use std::sync::Arc;
use std::time::Duration;

use sea_orm::Database;
use tracing::info;

use hackreg_event::cards::CardService;
use hackreg_event::clock::{Clock, SystemClock};
use hackreg_event::config::EventConfig;
use hackreg_event::events::EventBus;
use hackreg_event::mailer::SmtpMailer;
use hackreg_event::otp::OtpStore;
use hackreg_event::pending::PendingStore;
use hackreg_event::router::build_router;
use hackreg_event::state::AppState;

/// Expiry sweep cadence for the in-memory stores.
const SWEEP_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() {
    hackreg_core::tracing::init_tracing("hackreg_event=info,tower_http=warn");

    let config = EventConfig::from_env();

    let db = Database::connect(&config.db_url)
        .await
        .expect("failed to connect to database");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let otp = Arc::new(OtpStore::new(Arc::clone(&clock)));
    let pending = Arc::new(PendingStore::new(Arc::clone(&clock)));
    let _ = otp.spawn_sweeper(SWEEP_INTERVAL);
    let _ = pending.spawn_sweeper(SWEEP_INTERVAL);

    let mailer = SmtpMailer::from_config(&config).expect("invalid smtp configuration");
    let cards = CardService::from_config(&config);
    let events = EventBus::new(256);

    let state = AppState {
        db,
        otp,
        pending,
        clock,
        mailer,
        cards,
        events,
        dev_mode: config.dev_mode,
        team_id_prefix: config.team_id_prefix.clone(),
        max_team_size: config.max_team_size,
    };

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.app_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    info!("event service listening on {addr}");
    axum::serve(listener, router).await.expect("server error");
}

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use hackreg_core::middleware::{propagate_request_id_layer, request_id_layer};

use crate::handlers::{
    attendance::{manual_check_in, scan_check_in},
    download::download_id_cards,
    health::{healthz, readyz},
    register::{register, verify_otp},
    stats::{stats, stats_stream},
    teams::{get_team_by_code, get_team_by_id},
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Two-phase registration
        .route("/register", post(register))
        .route("/verify-otp", post(verify_otp))
        // Team lookups
        .route("/team/by-code/{team_code}", get(get_team_by_code))
        .route("/team/{team_id}", get(get_team_by_id))
        // Attendance
        .route("/attendance/checkin", post(manual_check_in))
        .route("/attendance/scan", post(scan_check_in))
        // Self-service card download
        .route("/download/id-cards", get(download_id_cards))
        // Dashboards
        .route("/stats", get(stats))
        .route("/stats/stream", get(stats_stream))
        // Request ids: minted outermost, echoed on the response.
        .layer(propagate_request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
        .with_state(state)
}

use axum::extract::State;
use axum::http::StatusCode;

use crate::state::AppState;

// ── GET /healthz ─────────────────────────────────────────────────────────────

/// Liveness check.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

// ── GET /readyz ──────────────────────────────────────────────────────────────

/// Readiness check: the service is ready once the credential store answers.
/// The in-memory stores and the mailer have no startup dependencies (an
/// unconfigured mailer is a valid degraded state, not unreadiness).
pub async fn readyz(State(state): State<AppState>) -> StatusCode {
    match state.db.ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "readiness probe failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

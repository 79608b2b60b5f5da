use std::convert::Infallible;

use axum::Json;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use tokio_stream::{Stream, StreamExt, wrappers::BroadcastStream};
use tracing::warn;

use crate::domain::types::EventStats;
use crate::error::EventServiceError;
use crate::state::AppState;
use crate::usecase::lookup::StatsUseCase;

// ── GET /stats ───────────────────────────────────────────────────────────────

pub async fn stats(
    State(state): State<AppState>,
) -> Result<Json<EventStats>, EventServiceError> {
    let usecase = StatsUseCase {
        teams: state.team_repo(),
    };
    Ok(Json(usecase.execute().await?))
}

// ── GET /stats/stream ────────────────────────────────────────────────────────

/// Live check-in feed for dashboards, one SSE event per successful check-in.
pub async fn stats_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = BroadcastStream::new(state.events.subscribe()).filter_map(|item| match item {
        Ok(event) => Event::default().event("checkin").json_data(&event).ok().map(Ok),
        Err(lagged) => {
            // A slow dashboard missed events; it resynchronises via /stats.
            warn!(error = %lagged, "stats stream lagged");
            None
        }
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

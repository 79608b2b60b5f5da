use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::error::EventServiceError;
use crate::state::AppState;
use crate::usecase::lookup::DownloadCardsUseCase;

#[derive(Debug, Deserialize)]
pub struct DownloadParams {
    pub team_id: String,
    pub key: String,
}

// ── GET /download/id-cards?team_id=…&key=… ───────────────────────────────────

pub async fn download_id_cards(
    State(state): State<AppState>,
    Query(params): Query<DownloadParams>,
) -> Result<Response, EventServiceError> {
    let usecase = DownloadCardsUseCase {
        teams: state.team_repo(),
        artifacts: state.cards.clone(),
    };
    let output = usecase.execute(&params.team_id, &params.key).await?;
    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_owned()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", output.filename),
        ),
    ];
    Ok((headers, output.bytes).into_response())
}

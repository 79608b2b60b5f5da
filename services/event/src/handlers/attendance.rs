use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EventServiceError;
use crate::handlers::teams::MemberView;
use crate::state::AppState;
use crate::usecase::checkin::{CheckInContext, CheckInUseCase};

#[derive(Debug, Serialize)]
pub struct CheckInResponse {
    pub status: &'static str,
    pub team_id: String,
    pub team_code: String,
    pub team_name: String,
    pub attendance: bool,
    #[serde(serialize_with = "hackreg_core::serde::to_rfc3339_ms")]
    pub check_in_time: DateTime<Utc>,
    pub participant: MemberView,
}

impl From<CheckInContext> for CheckInResponse {
    fn from(context: CheckInContext) -> Self {
        Self {
            status: "checked_in",
            team_id: context.team.team.team_id.clone(),
            team_code: context.team.team.team_code.clone(),
            team_name: context.team.team.team_name.clone(),
            attendance: true,
            check_in_time: context.checked_in_at,
            participant: MemberView::from(&context.participant),
        }
    }
}

// ── POST /attendance/checkin ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ManualCheckInRequest {
    pub team_id: String,
}

pub async fn manual_check_in(
    State(state): State<AppState>,
    Json(request): Json<ManualCheckInRequest>,
) -> Result<Json<CheckInResponse>, EventServiceError> {
    let usecase = CheckInUseCase {
        teams: state.team_repo(),
        events: state.events.clone(),
        clock: state.clock.clone(),
    };
    let context = usecase.manual(&request.team_id).await?;
    Ok(Json(CheckInResponse::from(context)))
}

// ── POST /attendance/scan ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ScanCheckInRequest {
    /// The UTF-8 JSON string decoded from the card's QR.
    pub payload: String,
}

pub async fn scan_check_in(
    State(state): State<AppState>,
    Json(request): Json<ScanCheckInRequest>,
) -> Result<Json<CheckInResponse>, EventServiceError> {
    let usecase = CheckInUseCase {
        teams: state.team_repo(),
        events: state.events.clone(),
        clock: state.clock.clone(),
    };
    let context = usecase.scan(&request.payload).await?;
    Ok(Json(CheckInResponse::from(context)))
}

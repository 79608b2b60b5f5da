use axum::{Json, extract::Path, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::types::{MemberRecord, TeamWithMembers};
use crate::error::EventServiceError;
use crate::state::AppState;
use crate::usecase::lookup::GetTeamUseCase;

/// Public view of a member. No internal row ids.
#[derive(Debug, Serialize)]
pub struct MemberView {
    pub participant_id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub is_team_leader: bool,
}

impl From<&MemberRecord> for MemberView {
    fn from(member: &MemberRecord) -> Self {
        Self {
            participant_id: member.participant_id.clone(),
            name: member.name.clone(),
            email: member.email.clone(),
            phone: member.phone.clone(),
            is_team_leader: member.is_team_leader,
        }
    }
}

/// Public view of a committed team. The access key is deliberately absent;
/// it only travels in the one-time verify response and the email.
#[derive(Debug, Serialize)]
pub struct TeamView {
    pub team_id: String,
    pub team_code: String,
    pub team_name: String,
    pub leader_name: String,
    pub leader_email: String,
    pub leader_phone: String,
    pub college_name: String,
    pub year: String,
    pub domain: String,
    pub attendance_status: bool,
    #[serde(serialize_with = "hackreg_core::serde::to_rfc3339_ms_opt")]
    pub check_in_time: Option<DateTime<Utc>>,
    #[serde(serialize_with = "hackreg_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    pub members: Vec<MemberView>,
}

impl From<&TeamWithMembers> for TeamView {
    fn from(found: &TeamWithMembers) -> Self {
        Self {
            team_id: found.team.team_id.clone(),
            team_code: found.team.team_code.clone(),
            team_name: found.team.team_name.clone(),
            leader_name: found.team.leader_name.clone(),
            leader_email: found.team.leader_email.clone(),
            leader_phone: found.team.leader_phone.clone(),
            college_name: found.team.college_name.clone(),
            year: found.team.year.clone(),
            domain: found.team.domain.clone(),
            attendance_status: found.team.attendance_status,
            check_in_time: found.team.check_in_time,
            created_at: found.team.created_at,
            members: found.members.iter().map(MemberView::from).collect(),
        }
    }
}

// ── GET /team/by-code/{team_code} ────────────────────────────────────────────

pub async fn get_team_by_code(
    State(state): State<AppState>,
    Path(team_code): Path<String>,
) -> Result<Json<TeamView>, EventServiceError> {
    let usecase = GetTeamUseCase {
        teams: state.team_repo(),
    };
    let found = usecase.by_code(&team_code).await?;
    Ok(Json(TeamView::from(&found)))
}

// ── GET /team/{team_id} ──────────────────────────────────────────────────────

pub async fn get_team_by_id(
    State(state): State<AppState>,
    Path(team_id): Path<String>,
) -> Result<Json<TeamView>, EventServiceError> {
    let usecase = GetTeamUseCase {
        teams: state.team_repo(),
    };
    let found = usecase.by_id(&team_id).await?;
    Ok(Json(TeamView::from(&found)))
}

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// OTP time-to-live.
pub const OTP_TTL_SECS: i64 = 300;
/// Pending-registration time-to-live: OTP TTL plus slack for re-issues.
pub const PENDING_TTL_SECS: i64 = 900;
/// OTP issues allowed per email in the trailing issue window.
pub const MAX_OTP_ISSUES_PER_WINDOW: usize = 3;
pub const OTP_ISSUE_WINDOW_SECS: i64 = 60;
/// Failed verify attempts allowed per email in the trailing verify window.
pub const MAX_VERIFY_ATTEMPTS_PER_WINDOW: usize = 3;
pub const VERIFY_ATTEMPT_WINDOW_SECS: i64 = 900;
/// Mint-and-insert retries when a generated identifier collides.
pub const CODE_RETRY_BUDGET: usize = 8;

// ── Registration payload ─────────────────────────────────────────────────────

/// One entry of `team_members`. Entry 0 is the leader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct MemberPayload {
    #[validate(length(min = 2, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,
    #[serde(default)]
    pub is_team_leader: bool,
}

/// The validated registration form, held verbatim in the pending store
/// until OTP verification commits it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_registration"))]
pub struct RegistrationPayload {
    #[validate(length(min = 2, max = 100))]
    pub team_name: String,
    #[validate(length(min = 2, max = 100))]
    pub leader_name: String,
    #[validate(email)]
    pub leader_email: String,
    #[validate(custom(function = "validate_phone"))]
    pub leader_phone: String,
    #[validate(length(min = 2, max = 100))]
    pub college_name: String,
    #[validate(length(min = 1, max = 50))]
    pub year: String,
    #[validate(length(min = 1, max = 50))]
    pub domain: String,
    #[validate(length(min = 1, max = 50), nested)]
    pub team_members: Vec<MemberPayload>,
    #[serde(default)]
    pub terms_accepted: bool,
}

pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    if (10..=20).contains(&digits) {
        Ok(())
    } else {
        let mut err = ValidationError::new("phone_digits");
        err.message = Some("phone number must contain 10 to 20 digits".into());
        Err(err)
    }
}

fn validate_registration(payload: &RegistrationPayload) -> Result<(), ValidationError> {
    if !payload.terms_accepted {
        let mut err = ValidationError::new("terms_accepted");
        err.message = Some("terms and conditions must be accepted".into());
        return Err(err);
    }
    let Some(leader) = payload.team_members.first() else {
        return Err(ValidationError::new("team_members"));
    };
    if !leader.is_team_leader {
        let mut err = ValidationError::new("team_members");
        err.message = Some("the first member must be flagged as team leader".into());
        return Err(err);
    }
    if payload.team_members.iter().skip(1).any(|m| m.is_team_leader) {
        let mut err = ValidationError::new("team_members");
        err.message = Some("only the first member may be the team leader".into());
        return Err(err);
    }
    if !leader.email.eq_ignore_ascii_case(&payload.leader_email) {
        let mut err = ValidationError::new("team_members");
        err.message = Some("the first member's email must equal leader_email".into());
        return Err(err);
    }
    Ok(())
}

// ── Committed records ────────────────────────────────────────────────────────

/// A durably committed team row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamRecord {
    pub id: Uuid,
    pub team_id: String,
    pub team_code: String,
    pub team_name: String,
    pub leader_name: String,
    pub leader_email: String,
    pub leader_phone: String,
    pub college_name: String,
    pub year: String,
    pub domain: String,
    pub access_key: String,
    pub attendance_status: bool,
    pub check_in_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRecord {
    pub id: Uuid,
    pub member_index: i32,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub participant_id: String,
    pub is_team_leader: bool,
}

/// A team with its members in index order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamWithMembers {
    pub team: TeamRecord,
    pub members: Vec<MemberRecord>,
}

impl TeamWithMembers {
    pub fn leader(&self) -> Option<&MemberRecord> {
        self.members.iter().find(|m| m.is_team_leader)
    }
}

// ── QR / scan payloads ───────────────────────────────────────────────────────

/// The payload embedded in each card's QR, UTF-8 JSON.
#[derive(Debug, Clone, Serialize)]
pub struct QrCardPayload {
    pub team_code: String,
    pub participant_id: String,
    pub participant_name: String,
    pub is_team_leader: bool,
    /// ISO-8601 issue timestamp.
    pub timestamp: String,
}

impl QrCardPayload {
    pub fn new(team: &TeamRecord, member: &MemberRecord, issued_at: DateTime<Utc>) -> Self {
        Self {
            team_code: team.team_code.clone(),
            participant_id: member.participant_id.clone(),
            participant_name: member.name.clone(),
            is_team_leader: member.is_team_leader,
            timestamp: issued_at.to_rfc3339(),
        }
    }
}

/// What the check-in orchestrator requires from a scanned QR string. Extra
/// keys (name, timestamp) are carried for display but never trusted.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanPayload {
    pub team_code: String,
    pub participant_id: String,
    #[serde(default)]
    pub participant_name: Option<String>,
    #[serde(default)]
    pub is_team_leader: Option<bool>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

// ── Check-in / stats ─────────────────────────────────────────────────────────

/// Result of the conditional attendance update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckInOutcome {
    CheckedIn { at: DateTime<Utc> },
    AlreadyCheckedIn { at: Option<DateTime<Utc>> },
    NotFound,
}

/// Aggregate counters for the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EventStats {
    pub total_teams: u64,
    pub total_members: u64,
    pub checked_in_teams: u64,
    pub domain_distribution: BTreeMap<String, u64>,
}

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::domain::types::RegistrationPayload;
use crate::error::EventServiceError;
use crate::handlers::teams::TeamView;
use crate::mint::RandomMint;
use crate::state::AppState;
use crate::usecase::register::RegisterUseCase;
use crate::usecase::verify::{VerifyOtpInput, VerifyOtpUseCase};

// ── POST /register ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub status: &'static str,
    pub message: String,
    pub expires_in_secs: u64,
    /// Present only under the development policy when mail is unconfigured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp: Option<String>,
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegistrationPayload>,
) -> Result<Json<RegisterResponse>, EventServiceError> {
    payload.validate()?;
    let usecase = RegisterUseCase {
        teams: state.team_repo(),
        mailer: state.mailer.clone(),
        otp: state.otp.clone(),
        pending: state.pending.clone(),
        dev_mode: state.dev_mode,
        max_team_size: state.max_team_size,
    };
    let output = usecase.execute(payload).await?;
    Ok(Json(RegisterResponse {
        status: "ok",
        message: output.message,
        expires_in_secs: output.expires_in_secs,
        otp: output.dev_otp,
    }))
}

// ── POST /verify-otp ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    #[validate(email)]
    pub leader_email: String,
    #[validate(custom(function = "validate_otp_shape"))]
    pub otp: String,
}

fn validate_otp_shape(otp: &str) -> Result<(), ValidationError> {
    if otp.len() == 6 && otp.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("otp_shape");
        err.message = Some("OTP must be exactly 6 digits".into());
        Err(err)
    }
}

#[derive(Debug, Serialize)]
pub struct VerifyOtpResponse {
    pub status: &'static str,
    pub team: TeamView,
    /// Pairs with `team_id` to authorise card re-downloads.
    pub access_key: String,
    pub artifacts_deferred: bool,
}

pub async fn verify_otp(
    State(state): State<AppState>,
    Json(request): Json<VerifyOtpRequest>,
) -> Result<Json<VerifyOtpResponse>, EventServiceError> {
    request.validate()?;
    let usecase = VerifyOtpUseCase {
        teams: state.team_repo(),
        mailer: state.mailer.clone(),
        artifacts: state.cards.clone(),
        mint: RandomMint,
        otp: state.otp.clone(),
        pending: state.pending.clone(),
        clock: state.clock.clone(),
        team_id_prefix: state.team_id_prefix.clone(),
    };
    let output = usecase
        .execute(VerifyOtpInput {
            leader_email: request.leader_email,
            otp: request.otp,
        })
        .await?;
    Ok(Json(VerifyOtpResponse {
        status: "registered",
        access_key: output.team.team.access_key.clone(),
        team: TeamView::from(&output.team),
        artifacts_deferred: output.artifacts_deferred,
    }))
}

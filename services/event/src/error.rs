use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;
use validator::ValidationErrors;

/// Event service error variants mapped to HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum EventServiceError {
    #[error("validation failed")]
    Validation(#[from] ValidationErrors),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("this email is already registered with a team")]
    EmailAlreadyRegistered,
    #[error("registration data has expired; submit the form again")]
    RegistrationExpired,
    #[error("invalid OTP; {attempts_left} attempts remaining")]
    OtpInvalid { attempts_left: u32 },
    #[error("OTP has expired; request a new one")]
    OtpExpired,
    #[error("too many requests; retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
    #[error("team not found")]
    TeamNotFound,
    #[error("team is already checked in")]
    AlreadyCheckedIn {
        checked_in_at: Option<DateTime<Utc>>,
    },
    #[error("invalid scan payload: {0}")]
    InvalidPayload(String),
    #[error("invalid access key")]
    InvalidAccessKey,
    #[error("mail transport is not configured")]
    Unconfigured,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl EventServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::EmailAlreadyRegistered => "EMAIL_ALREADY_REGISTERED",
            Self::RegistrationExpired => "REGISTRATION_EXPIRED",
            Self::OtpInvalid { .. } => "OTP_INVALID",
            Self::OtpExpired => "OTP_EXPIRED",
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::TeamNotFound => "NOT_FOUND",
            Self::AlreadyCheckedIn { .. } => "ALREADY_CHECKED_IN",
            Self::InvalidPayload(_) => "INVALID_PAYLOAD",
            Self::InvalidAccessKey => "INVALID_ACCESS_KEY",
            Self::Unconfigured => "UNCONFIGURED",
            Self::Internal(_) => "INTERNAL",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_)
            | Self::BadRequest(_)
            | Self::OtpInvalid { .. }
            | Self::AlreadyCheckedIn { .. }
            | Self::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            Self::InvalidAccessKey => StatusCode::UNAUTHORIZED,
            Self::TeamNotFound => StatusCode::NOT_FOUND,
            Self::EmailAlreadyRegistered => StatusCode::CONFLICT,
            Self::RegistrationExpired | Self::OtpExpired => StatusCode::GONE,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Unconfigured | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for EventServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });

        match &self {
            Self::Validation(errors) => {
                // Field-level reasons; ValidationErrors serializes per field.
                if let Ok(fields) = serde_json::to_value(errors) {
                    body["fields"] = fields;
                }
            }
            Self::AlreadyCheckedIn { checked_in_at } => {
                body["check_in_time"] = match checked_in_at {
                    Some(at) => at.to_rfc3339_opts(SecondsFormat::Millis, true).into(),
                    None => serde_json::Value::Null,
                };
            }
            Self::RateLimited { retry_after_secs } => {
                body["retry_after_secs"] = (*retry_after_secs).into();
            }
            Self::Unconfigured | Self::Internal(_) => {
                // Operator-facing detail stays in the log; the client gets a
                // correlation id to quote back.
                let correlation_id = Uuid::new_v4().to_string();
                let detail = match &self {
                    Self::Internal(e) => format!("{e:#}"),
                    other => other.to_string(),
                };
                tracing::error!(
                    error = %detail,
                    kind = self.kind(),
                    correlation_id = %correlation_id,
                    "internal error"
                );
                body["correlation_id"] = correlation_id.into();
            }
            _ => {}
        }

        let mut response = (status, Json(body)).into_response();
        if let Self::RateLimited { retry_after_secs } = &self {
            if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

//! HTTP error envelope.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::relay::RelayError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Failed bot verification")]
    VerificationFailed,

    #[error("Origin not allowed")]
    OriginNotAllowed,

    #[error("Invalid approval link")]
    Forbidden,

    #[error("Not found")]
    NotFound,

    #[error("{0}")]
    Internal(&'static str),

    #[error("Your enquiry was delivered but the confirmation email failed")]
    PartialDelivery,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::VerificationFailed => StatusCode::BAD_REQUEST,
            ApiError::OriginNotAllowed | ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) | ApiError::PartialDelivery => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RelayError> for ApiError {
    fn from(e: RelayError) -> Self {
        match e {
            RelayError::Validation(e) => ApiError::BadRequest(e.to_string()),
            RelayError::Captcha(e) if e.is_client_error() => ApiError::VerificationFailed,
            RelayError::Captcha(_) => ApiError::Internal("Verification unavailable"),
            RelayError::Notification(_) => ApiError::Internal("Contact email failed"),
            RelayError::PartialDelivery { .. } => ApiError::PartialDelivery,
            RelayError::Moderation { .. } => ApiError::Internal("Testimonial failed"),
            RelayError::ApprovalDisabled | RelayError::NotFound(_) => ApiError::NotFound,
            RelayError::InvalidSignature => ApiError::Forbidden,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::PartialDelivery => json!({
                "error": self.to_string(),
                "businessNotified": true,
                "confirmationSent": false,
            }),
            _ => json!({ "error": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

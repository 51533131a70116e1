//! Endpoint handlers.
//!
//! Handlers only unpack the request and map the pipeline result onto HTTP.
//! All behaviour lives in [`Relay`].

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ApiError;
use crate::captcha::BotVerifier;
use crate::email::Mailer;
use crate::relay::{Delivery, Relay};
use crate::store::{Testimonial, TestimonialStore};
use crate::submission::{ContactForm, TestimonialForm};
use crate::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub relay: Relay,
}

impl AppState {
    pub fn new(
        config: Config,
        verifier: Arc<dyn BotVerifier>,
        mailer: Arc<dyn Mailer>,
        store: Arc<dyn TestimonialStore>,
    ) -> Self {
        let config = Arc::new(config);
        Self {
            relay: Relay::new(Arc::clone(&config), verifier, mailer, store),
            config,
        }
    }
}

// =============================================================================
// Liveness
// =============================================================================

/// Plain-text liveness probe.
pub async fn liveness() -> &'static str {
    "Backend is live!"
}

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Contact
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactResponse {
    pub message: &'static str,
    pub business_notified: bool,
    pub confirmation_sent: bool,
}

/// `POST /contact`
pub async fn submit_contact(
    State(state): State<AppState>,
    payload: Result<Json<ContactForm>, JsonRejection>,
) -> Result<Json<ContactResponse>, ApiError> {
    let Json(form) = payload?;
    let dispatch = state.relay.submit_contact(&form).await?;

    let message = match dispatch.confirmation {
        Delivery::Sent { .. } => "Contact emails sent successfully",
        _ => "Contact email sent successfully",
    };

    Ok(Json(ContactResponse {
        message,
        business_notified: dispatch.business.is_sent(),
        confirmation_sent: dispatch.confirmation.is_sent(),
    }))
}

// =============================================================================
// Testimonials
// =============================================================================

/// `GET /testimonials`
pub async fn list_testimonials(State(state): State<AppState>) -> Json<Vec<Testimonial>> {
    Json(state.relay.list_testimonials().await)
}

/// `POST /testimonials`
pub async fn submit_testimonial(
    State(state): State<AppState>,
    payload: Result<Json<TestimonialForm>, JsonRejection>,
) -> Result<(StatusCode, Json<Testimonial>), ApiError> {
    let Json(form) = payload?;
    let testimonial = state.relay.submit_testimonial(&form).await?;
    Ok((StatusCode::CREATED, Json(testimonial)))
}

#[derive(Debug, Deserialize)]
pub struct ApproveQuery {
    #[serde(default)]
    pub sig: Option<String>,
}

/// `GET /testimonials/:id/approve?sig=...`
pub async fn approve_testimonial(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    Query(query): Query<ApproveQuery>,
) -> Result<Json<Testimonial>, ApiError> {
    let Path(id) = id.map_err(|_| ApiError::NotFound)?;
    let signature = query.sig.unwrap_or_default();
    let testimonial = state.relay.approve_testimonial(id, &signature).await?;
    Ok(Json(testimonial))
}

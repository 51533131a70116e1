//! HTTP surface.
//!
//! ```text
//! GET  /                              liveness text
//! GET  /health                        {"status":"ok"}
//! POST /contact                       relay a contact or party enquiry
//! GET  /testimonials                  approved testimonials, newest first
//! POST /testimonials                  submit a testimonial
//! GET  /testimonials/:id/approve      signed moderation link
//! ```

pub mod error;
pub mod handlers;
pub mod origin;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use error::ApiError;
pub use handlers::{AppState, ContactResponse, HealthResponse};
pub use origin::{cors_layer, is_origin_allowed, origin_gate};

/// Build the router with the origin gate, CORS and request tracing.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(state.config.allowed_origins.as_deref());

    Router::new()
        .route("/", get(handlers::liveness))
        .route("/health", get(handlers::health))
        .route("/contact", post(handlers::submit_contact))
        .route(
            "/testimonials",
            get(handlers::list_testimonials).post(handlers::submit_testimonial),
        )
        .route(
            "/testimonials/:id/approve",
            get(handlers::approve_testimonial),
        )
        .layer(middleware::from_fn_with_state(state.clone(), origin_gate))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

//! FormRelay - contact form and testimonial relay.
//!
//! Browser forms post here; submissions are checked with a bot-verification
//! service and relayed through a transactional email API. Testimonials are
//! kept in memory and published once approved.
//!
//! ## Architecture
//!
//! ```text
//! Browser → origin gate → handler → Relay → BotVerifier
//!                                        ├→ Mailer
//!                                        └→ TestimonialStore
//! ```

pub mod approval;
pub mod captcha;
pub mod config;
pub mod email;
pub mod relay;
pub mod store;
pub mod submission;
pub mod web;

// Re-export commonly used types
pub use captcha::{BotVerifier, CaptchaError, RecaptchaVerifier};
pub use config::{Config, ConfigError};
pub use email::{MailError, Mailer, OutgoingEmail, ResendMailer};
pub use relay::{ContactDispatch, Delivery, Relay, RelayError};
pub use store::{InMemoryTestimonialStore, Testimonial, TestimonialStore};
pub use web::{build_router, AppState};

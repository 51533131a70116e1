//! Outbound transactional email.
//!
//! This module provides:
//! - The [`Mailer`] seam the submission pipeline sends through
//! - A Resend HTTP API implementation
//! - Rendering of the notification, confirmation and moderation messages

pub mod render;
pub mod resend;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;

pub use resend::ResendMailer;

/// A single message ready to hand to the provider.
///
/// Serializes directly into the provider's request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
}

/// Something that can deliver an [`OutgoingEmail`].
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send one message, returning the provider's message id.
    async fn send(&self, email: &OutgoingEmail) -> Result<String, MailError>;
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("email provider unreachable: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("email provider rejected the message with HTTP {status}: {body}")]
    Rejected { status: StatusCode, body: String },

    #[error("email provider returned an unreadable body: {0}")]
    MalformedResponse(#[source] reqwest::Error),

    #[error("email template failed to render: {0}")]
    Template(#[from] tinytemplate::error::Error),
}

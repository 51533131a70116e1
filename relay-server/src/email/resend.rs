//! Resend email API client.
//!
//! Reference: https://resend.com/docs/api-reference/emails/send-email

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{error, info};

use super::{MailError, Mailer, OutgoingEmail};
use crate::Config;

/// Longest provider error body kept for diagnostics.
const ERROR_BODY_PREVIEW: usize = 500;

/// Sends email through the Resend `POST /emails` endpoint.
pub struct ResendMailer {
    client: Client,
    api_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: String,
}

impl ResendMailer {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            api_url: config.resend_api_url.clone(),
            api_key: config.resend_api_key.clone(),
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<String, MailError> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(email)
            .send()
            .await
            .map_err(|e| {
                error!(
                    endpoint = %self.api_url,
                    is_timeout = e.is_timeout(),
                    error = %e,
                    "email_send_transport_error"
                );
                MailError::Transport(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > ERROR_BODY_PREVIEW {
                let mut cut = ERROR_BODY_PREVIEW;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            error!(
                endpoint = %self.api_url,
                status_code = status.as_u16(),
                body = %body,
                subject = %email.subject,
                "email_send_rejected"
            );
            return Err(MailError::Rejected { status, body });
        }

        let sent: SendResponse = response.json().await.map_err(|e| {
            error!(endpoint = %self.api_url, error = %e, "email_send_malformed_response");
            MailError::MalformedResponse(e)
        })?;

        info!(
            email_id = %sent.id,
            recipients = email.to.len(),
            subject = %email.subject,
            "email_sent"
        );

        Ok(sent.id)
    }
}

//! The submission pipeline.
//!
//! ## Contact
//!
//! ```text
//! validate → verify token → notify business → confirm to submitter
//! ```
//!
//! ## Testimonial
//!
//! ```text
//! validate → verify token → store (approved = auto_approve) → notify owner if pending
//! ```
//!
//! Each step runs only if the previous one succeeded. Nothing is retried.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tinytemplate::error::Error as TemplateError;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::approval::{approval_url, verify_approval};
use crate::captcha::{BotVerifier, CaptchaError};
use crate::email::{render, MailError, Mailer, OutgoingEmail};
use crate::store::{Testimonial, TestimonialStore};
use crate::submission::{ContactForm, TestimonialForm, ValidationError};
use crate::Config;

/// Outcome of one email in a multi-email dispatch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Delivery {
    Sent { id: String },
    Failed,
    Skipped,
}

impl Delivery {
    pub fn is_sent(&self) -> bool {
        matches!(self, Delivery::Sent { .. })
    }
}

/// Which of the two contact emails went out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactDispatch {
    pub business: Delivery,
    pub confirmation: Delivery,
}

#[derive(Debug, Error)]
pub enum RelayError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Captcha(#[from] CaptchaError),

    /// The business notification failed; nothing was delivered.
    #[error("business notification failed: {0}")]
    Notification(#[source] MailError),

    /// The business was notified but the submitter confirmation failed.
    #[error("confirmation failed after business was notified: {source}")]
    PartialDelivery {
        dispatch: ContactDispatch,
        #[source]
        source: MailError,
    },

    /// The testimonial was stored but the owner could not be told.
    #[error("testimonial {id} stored but moderation email failed: {source}")]
    Moderation {
        id: Uuid,
        #[source]
        source: MailError,
    },

    #[error("testimonial approval is not configured")]
    ApprovalDisabled,

    #[error("invalid approval signature")]
    InvalidSignature,

    #[error("testimonial {0} not found")]
    NotFound(Uuid),
}

/// Runs submissions through verification, storage and email.
#[derive(Clone)]
pub struct Relay {
    config: Arc<Config>,
    verifier: Arc<dyn BotVerifier>,
    mailer: Arc<dyn Mailer>,
    store: Arc<dyn TestimonialStore>,
}

impl Relay {
    pub fn new(
        config: Arc<Config>,
        verifier: Arc<dyn BotVerifier>,
        mailer: Arc<dyn Mailer>,
        store: Arc<dyn TestimonialStore>,
    ) -> Self {
        Self {
            config,
            verifier,
            mailer,
            store,
        }
    }

    /// Verify and relay a contact form.
    pub async fn submit_contact(
        &self,
        form: &ContactForm,
    ) -> Result<ContactDispatch, RelayError> {
        let contact = form.validate()?;
        info!(
            has_phone = contact.phone.is_some(),
            party_fields = contact.party.entries().len(),
            message_length = contact.message.len(),
            "contact_received"
        );

        self.verifier.verify(contact.recaptcha_token).await?;

        let notification = render::contact_notification(
            &self.config.mail_from,
            &self.config.contact_recipient,
            &contact,
        );
        let business_id = self
            .deliver(notification)
            .await
            .map_err(RelayError::Notification)?;
        info!(email_id = %business_id, "contact_business_notified");

        let business = Delivery::Sent { id: business_id };

        if !self.config.send_confirmation {
            return Ok(ContactDispatch {
                business,
                confirmation: Delivery::Skipped,
            });
        }

        let confirmation =
            render::contact_confirmation(&self.config.mail_from, &self.config.site_name, &contact);
        match self.deliver(confirmation).await {
            Ok(id) => {
                info!(email_id = %id, "contact_confirmation_sent");
                Ok(ContactDispatch {
                    business,
                    confirmation: Delivery::Sent { id },
                })
            }
            Err(source) => {
                // The lead already reached the business; a resubmission would duplicate it.
                error!(error = %source, "contact_confirmation_failed_after_notify");
                Err(RelayError::PartialDelivery {
                    dispatch: ContactDispatch {
                        business,
                        confirmation: Delivery::Failed,
                    },
                    source,
                })
            }
        }
    }

    /// Verify, store and, if moderation is on, announce a testimonial.
    pub async fn submit_testimonial(
        &self,
        form: &TestimonialForm,
    ) -> Result<Testimonial, RelayError> {
        let submission = form.validate()?;
        info!(
            rating = submission.rating,
            has_location = submission.location.is_some(),
            "testimonial_received"
        );

        self.verifier.verify(submission.recaptcha_token).await?;

        let testimonial = Testimonial::new(
            submission.name,
            submission.location,
            submission.review,
            submission.rating,
            self.config.auto_approve,
        );
        self.store.insert(testimonial.clone()).await;
        info!(
            testimonial_id = %testimonial.id,
            approved = testimonial.approved,
            "testimonial_stored"
        );

        if testimonial.approved {
            return Ok(testimonial);
        }

        let Some(owner) = self.config.owner_email.as_deref() else {
            warn!(testimonial_id = %testimonial.id, "testimonial_pending_no_owner_email");
            return Ok(testimonial);
        };

        let link = self.approval_link(testimonial.id);
        let email = render::testimonial_moderation(
            &self.config.mail_from,
            owner,
            &testimonial,
            link.as_deref(),
        );
        match self.deliver(email).await {
            Ok(id) => {
                info!(
                    testimonial_id = %testimonial.id,
                    email_id = %id,
                    has_approval_link = link.is_some(),
                    "testimonial_owner_notified"
                );
                Ok(testimonial)
            }
            Err(source) => {
                error!(
                    testimonial_id = %testimonial.id,
                    error = %source,
                    "testimonial_owner_notify_failed"
                );
                Err(RelayError::Moderation {
                    id: testimonial.id,
                    source,
                })
            }
        }
    }

    /// Approved testimonials, most recent first.
    pub async fn list_testimonials(&self) -> Vec<Testimonial> {
        self.store.list_approved().await
    }

    /// Approve a testimonial from a signed moderation link.
    pub async fn approve_testimonial(
        &self,
        id: Uuid,
        signature: &str,
    ) -> Result<Testimonial, RelayError> {
        let Some(key) = self.config.approval_signing_key.as_deref() else {
            warn!(testimonial_id = %id, "approval_attempt_while_disabled");
            return Err(RelayError::ApprovalDisabled);
        };

        if !verify_approval(key, id, signature) {
            return Err(RelayError::InvalidSignature);
        }

        let testimonial = self
            .store
            .approve(id)
            .await
            .ok_or(RelayError::NotFound(id))?;
        info!(testimonial_id = %id, "testimonial_approved");
        Ok(testimonial)
    }

    async fn deliver(
        &self,
        rendered: Result<OutgoingEmail, TemplateError>,
    ) -> Result<String, MailError> {
        let email = rendered?;
        self.mailer.send(&email).await
    }

    fn approval_link(&self, id: Uuid) -> Option<String> {
        let base = self.config.public_base_url.as_deref()?;
        let key = self.config.approval_signing_key.as_deref()?;
        approval_url(base, key, id)
    }
}

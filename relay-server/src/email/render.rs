//! Message composition for the three kinds of outgoing email.
//!
//! Markup lives in `assets/*.html` as TinyTemplate templates. The default
//! formatter HTML-escapes every submitted value.

use serde::Serialize;
use tinytemplate::{error::Error, TinyTemplate};

use super::OutgoingEmail;
use crate::store::Testimonial;
use crate::submission::ValidatedContact;

pub const CONTACT_NOTIFICATION_SUBJECT: &str = "New Contact Form Submission";
pub const CONTACT_CONFIRMATION_SUBJECT: &str = "We've received your enquiry";
pub const TESTIMONIAL_MODERATION_SUBJECT: &str = "New Testimonial Pending Approval";

const CONTACT_NOTIFICATION_TEMPLATE_NAME: &str = "contact-notification";
const CONTACT_CONFIRMATION_TEMPLATE_NAME: &str = "contact-confirmation";
const TESTIMONIAL_MODERATION_TEMPLATE_NAME: &str = "testimonial-moderation";
const CONTACT_NOTIFICATION_TEMPLATE: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/assets/contact-notification.html"
));
const CONTACT_CONFIRMATION_TEMPLATE: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/assets/contact-confirmation.html"
));
const TESTIMONIAL_MODERATION_TEMPLATE: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/assets/testimonial-moderation.html"
));

#[derive(Serialize)]
struct Field {
    label: &'static str,
    value: String,
}

impl Field {
    fn new(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
        }
    }
}

#[derive(Serialize)]
struct NotificationContext<'a> {
    fields: Vec<Field>,
    message: &'a str,
}

#[derive(Serialize)]
struct ConfirmationContext<'a> {
    name: &'a str,
    site_name: &'a str,
}

#[derive(Serialize)]
struct ModerationContext<'a> {
    fields: Vec<Field>,
    approve_url: Option<&'a str>,
}

fn templates() -> Result<TinyTemplate<'static>, Error> {
    let mut tt = TinyTemplate::new();
    tt.add_template(CONTACT_NOTIFICATION_TEMPLATE_NAME, CONTACT_NOTIFICATION_TEMPLATE)?;
    tt.add_template(CONTACT_CONFIRMATION_TEMPLATE_NAME, CONTACT_CONFIRMATION_TEMPLATE)?;
    tt.add_template(
        TESTIMONIAL_MODERATION_TEMPLATE_NAME,
        TESTIMONIAL_MODERATION_TEMPLATE,
    )?;
    Ok(tt)
}

fn render_template<C: Serialize>(name: &str, context: &C) -> Result<String, Error> {
    templates()?.render(name, context)
}

/// Notification to the business with every submitted field.
pub fn contact_notification(
    from: &str,
    to: &str,
    contact: &ValidatedContact<'_>,
) -> Result<OutgoingEmail, Error> {
    let mut fields = vec![
        Field::new("Name", contact.name),
        Field::new("Email", contact.email),
        Field::new("Phone", contact.phone.unwrap_or("N/A")),
    ];
    fields.extend(
        contact
            .party
            .entries()
            .into_iter()
            .map(|(label, value)| Field::new(label, value)),
    );

    let html = render_template(
        CONTACT_NOTIFICATION_TEMPLATE_NAME,
        &NotificationContext {
            fields,
            message: contact.message,
        },
    )?;

    Ok(OutgoingEmail {
        from: from.to_string(),
        to: vec![to.to_string()],
        subject: CONTACT_NOTIFICATION_SUBJECT.to_string(),
        html,
        reply_to: Some(contact.email.to_string()),
    })
}

/// Acknowledgement sent back to the submitter.
pub fn contact_confirmation(
    from: &str,
    site_name: &str,
    contact: &ValidatedContact<'_>,
) -> Result<OutgoingEmail, Error> {
    let html = render_template(
        CONTACT_CONFIRMATION_TEMPLATE_NAME,
        &ConfirmationContext {
            name: contact.name,
            site_name,
        },
    )?;

    Ok(OutgoingEmail {
        from: from.to_string(),
        to: vec![contact.email.to_string()],
        subject: CONTACT_CONFIRMATION_SUBJECT.to_string(),
        html,
        reply_to: None,
    })
}

/// Moderation request to the owner for a pending testimonial.
pub fn testimonial_moderation(
    from: &str,
    to: &str,
    testimonial: &Testimonial,
    approve_url: Option<&str>,
) -> Result<OutgoingEmail, Error> {
    let fields = vec![
        Field::new("Name", testimonial.author.as_str()),
        Field::new("Rating", testimonial.rating.to_string()),
        Field::new("Review", testimonial.text.as_str()),
    ];

    let html = render_template(
        TESTIMONIAL_MODERATION_TEMPLATE_NAME,
        &ModerationContext {
            fields,
            approve_url,
        },
    )?;

    Ok(OutgoingEmail {
        from: from.to_string(),
        to: vec![to.to_string()],
        subject: TESTIMONIAL_MODERATION_SUBJECT.to_string(),
        html,
        reply_to: None,
    })
}

//! Inbound form payloads.
//!
//! Every field arrives optional so that a missing field becomes a 400 with a
//! useful message instead of a generic deserialization failure. `validate()`
//! turns a raw form into a borrowed, fully-populated view.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Missing verification token")]
    MissingToken,

    #[error("Rating must be a finite number")]
    InvalidRating,
}

// =============================================================================
// Contact / Enquiry
// =============================================================================

/// Contact or party-enquiry form body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactForm {
    #[serde(default, alias = "Name")]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub phone: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub recaptcha_token: Option<String>,
    #[serde(flatten)]
    pub party: PartyDetails,
}

/// Optional party-booking fields carried by enquiry forms.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyDetails {
    #[serde(default, deserialize_with = "lenient_text")]
    pub child_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub child_age: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub character: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub package: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub event_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub event_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub guest_count: Option<String>,
    #[serde(default)]
    pub parking_available: Option<bool>,
    #[serde(default)]
    pub indoor_venue: Option<bool>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub additional_info: Option<String>,
}

impl PartyDetails {
    /// Labelled fields that were actually provided, in display order.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let text = [
            ("Child's name", &self.child_name),
            ("Child's age", &self.child_age),
            ("Character", &self.character),
            ("Package", &self.package),
            ("Date", &self.event_date),
            ("Time", &self.event_time),
            ("Location", &self.location),
            ("Guests", &self.guest_count),
        ];
        let flags = [
            ("Parking available", self.parking_available),
            ("Indoor venue", self.indoor_venue),
        ];

        let mut entries: Vec<(&'static str, String)> = text
            .into_iter()
            .filter_map(|(label, value)| non_blank(value).map(|v| (label, v.to_string())))
            .collect();
        entries.extend(flags.into_iter().filter_map(|(label, value)| {
            value.map(|v| (label, if v { "Yes" } else { "No" }.to_string()))
        }));
        if let Some(info) = non_blank(&self.additional_info) {
            entries.push(("Additional information", info.to_string()));
        }
        entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

/// A contact form with every required field present.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedContact<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub phone: Option<&'a str>,
    pub message: &'a str,
    pub recaptcha_token: &'a str,
    pub party: &'a PartyDetails,
}

impl ContactForm {
    pub fn validate(&self) -> Result<ValidatedContact<'_>, ValidationError> {
        let name = required(&self.name, "name")?;
        let email = required(&self.email, "email")?.trim();
        let message = required(&self.message, "message")?;
        if !looks_like_email(email) {
            return Err(ValidationError::InvalidEmail);
        }
        let recaptcha_token =
            non_blank(&self.recaptcha_token).ok_or(ValidationError::MissingToken)?;

        Ok(ValidatedContact {
            name,
            email,
            phone: non_blank(&self.phone),
            message,
            recaptcha_token,
            party: &self.party,
        })
    }
}

// =============================================================================
// Testimonial
// =============================================================================

/// Testimonial form body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestimonialForm {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub review: Option<String>,
    #[serde(default)]
    pub rating: Option<RatingInput>,
    #[serde(default)]
    pub recaptcha_token: Option<String>,
}

/// Ratings arrive either as JSON numbers or as numeric strings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RatingInput {
    Number(f64),
    Text(String),
}

impl RatingInput {
    fn to_finite(&self) -> Option<f64> {
        let value = match self {
            RatingInput::Number(n) => *n,
            RatingInput::Text(s) => s.trim().parse().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ValidatedTestimonial<'a> {
    pub name: &'a str,
    pub location: Option<&'a str>,
    pub review: &'a str,
    pub rating: f64,
    pub recaptcha_token: &'a str,
}

impl TestimonialForm {
    pub fn validate(&self) -> Result<ValidatedTestimonial<'_>, ValidationError> {
        let name = required(&self.name, "name")?;
        let review = required(&self.review, "review")?;
        let rating = self
            .rating
            .as_ref()
            .ok_or(ValidationError::MissingField("rating"))?
            .to_finite()
            .ok_or(ValidationError::InvalidRating)?;
        let recaptcha_token =
            non_blank(&self.recaptcha_token).ok_or(ValidationError::MissingToken)?;

        Ok(ValidatedTestimonial {
            name,
            location: non_blank(&self.location),
            review,
            rating,
            recaptcha_token,
        })
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn required<'a>(
    value: &'a Option<String>,
    field: &'static str,
) -> Result<&'a str, ValidationError> {
    non_blank(value).ok_or(ValidationError::MissingField(field))
}

/// Minimal shape check: something on both sides of a single `@`, no spaces.
fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

/// Accept strings, numbers and booleans for free-text fields.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

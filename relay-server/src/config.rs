//! Configuration module for environment variable parsing.
//!
//! All configuration is read once at startup and handed to the rest of the
//! service as an explicit [`Config`]. Nothing below `main` reads the
//! environment.

use std::env;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

/// Default reCAPTCHA verification endpoint.
pub const DEFAULT_RECAPTCHA_VERIFY_URL: &str = "https://www.google.com/recaptcha/api/siteverify";

/// Default Resend email API endpoint.
pub const DEFAULT_RESEND_API_URL: &str = "https://api.resend.com/emails";

/// Configuration errors that prevent startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
}

/// Application configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Resend API key
    pub resend_api_key: String,

    /// Resend endpoint for sending a single email
    pub resend_api_url: String,

    /// reCAPTCHA server-side secret
    pub recaptcha_secret: String,

    /// reCAPTCHA siteverify endpoint
    pub recaptcha_verify_url: String,

    /// Scores must be strictly greater than this to pass
    pub recaptcha_min_score: f64,

    /// Exact origins allowed to call the API. `None` allows any origin.
    pub allowed_origins: Option<Vec<String>>,

    /// `From` identity for every outgoing email
    pub mail_from: String,

    /// Business address that receives contact notifications
    pub contact_recipient: String,

    /// Whether submitters get a confirmation email
    pub send_confirmation: bool,

    /// Name used to sign the confirmation email
    pub site_name: String,

    /// Moderation recipient for pending testimonials
    pub owner_email: Option<String>,

    /// New testimonials are visible immediately when set
    pub auto_approve: bool,

    /// Public URL of this service, used to build approval links
    pub public_base_url: Option<String>,

    /// HMAC key for approval links. Approval is disabled without it.
    pub approval_signing_key: Option<String>,

    /// Timeout for outbound HTTP calls in milliseconds
    pub request_timeout_ms: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(name))
        };
        let optional = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Ok(Config {
            port: parse_number(&lookup, "PORT", 5000),

            resend_api_key: required("RESEND_API_KEY")?,

            resend_api_url: optional("RESEND_API_URL")
                .unwrap_or_else(|| DEFAULT_RESEND_API_URL.to_string()),

            recaptcha_secret: required("RECAPTCHA_SECRET_KEY")?,

            recaptcha_verify_url: optional("RECAPTCHA_VERIFY_URL")
                .unwrap_or_else(|| DEFAULT_RECAPTCHA_VERIFY_URL.to_string()),

            recaptcha_min_score: parse_number(&lookup, "RECAPTCHA_MIN_SCORE", 0.5),

            allowed_origins: lookup("ALLOWED_ORIGINS").map(|raw| parse_csv(&raw)),

            mail_from: required("MAIL_FROM")?,

            contact_recipient: required("CONTACT_RECIPIENT")?,

            send_confirmation: lookup("SEND_CONFIRMATION")
                .map(|v| parse_flag(&v))
                .unwrap_or(true),

            site_name: optional("SITE_NAME").unwrap_or_else(|| "our team".to_string()),

            owner_email: optional("OWNER_EMAIL"),

            auto_approve: lookup("AUTO_APPROVE")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),

            public_base_url: optional("PUBLIC_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string()),

            approval_signing_key: optional("APPROVAL_SIGNING_KEY"),

            request_timeout_ms: parse_number(&lookup, "REQUEST_TIMEOUT_MS", 8000),
        })
    }

    /// Timeout applied to every outbound request.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Approval links can only be produced when both pieces are configured.
    pub fn approval_links_enabled(&self) -> bool {
        self.public_base_url.is_some() && self.approval_signing_key.is_some()
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("resend_api_url", &self.resend_api_url)
            .field("recaptcha_verify_url", &self.recaptcha_verify_url)
            .field("recaptcha_min_score", &self.recaptcha_min_score)
            .field("allowed_origins", &self.allowed_origins)
            .field("mail_from", &self.mail_from)
            .field("contact_recipient", &self.contact_recipient)
            .field("send_confirmation", &self.send_confirmation)
            .field("owner_email", &self.owner_email)
            .field("auto_approve", &self.auto_approve)
            .field("public_base_url", &self.public_base_url)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .finish_non_exhaustive()
    }
}

/// Parse a numeric variable, warning and falling back on garbage.
fn parse_number<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let Some(raw) = lookup(name) else {
        return default;
    };

    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid number, using default");
            default
        }
    }
}

/// Parse a boolean switch.
fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes"
    )
}

/// Parse a comma-separated list of strings.
fn parse_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

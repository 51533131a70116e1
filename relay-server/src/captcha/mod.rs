//! Bot-verification gate.
//!
//! Submissions carry an opaque token issued to the browser by the
//! verification service. The token is checked server-side before any
//! email is sent or any record is stored.
//!
//! ## Policy
//!
//! ```text
//! pass  <=>  success == true  &&  score > threshold
//! ```
//!
//! A verifier that cannot be reached, answers with a non-2xx status, or
//! returns an unreadable body never lets a request through.

pub mod recaptcha;

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

pub use recaptcha::RecaptchaVerifier;

/// Something that can decide whether a token came from a human.
#[async_trait]
pub trait BotVerifier: Send + Sync {
    /// Verify a client-supplied token, returning `Ok(())` only on a pass.
    async fn verify(&self, token: &str) -> Result<(), CaptchaError>;
}

/// Why a token did not pass.
#[derive(Debug, Error)]
pub enum CaptchaError {
    /// The verifier answered, and the answer was "no".
    #[error("verification rejected (score {score:?})")]
    Rejected { score: Option<f64> },

    /// The verifier says our own secret is missing or wrong.
    #[error("verifier rejected the server secret: {0:?}")]
    Misconfigured(Vec<String>),

    #[error("verifier unreachable: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("verifier returned HTTP {0}")]
    UpstreamStatus(StatusCode),

    #[error("verifier returned an unreadable body: {0}")]
    MalformedResponse(#[source] reqwest::Error),
}

impl CaptchaError {
    /// Whether the failure is the submitter's fault rather than ours.
    pub fn is_client_error(&self) -> bool {
        matches!(self, CaptchaError::Rejected { .. })
    }
}

/// Apply the pass/fail threshold to a verifier answer.
///
/// A missing or non-finite score never passes.
pub fn passes_threshold(success: bool, score: Option<f64>, threshold: f64) -> bool {
    success && score.is_some_and(|s| s.is_finite() && s > threshold)
}

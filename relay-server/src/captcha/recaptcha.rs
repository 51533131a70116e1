//! Google reCAPTCHA v3 `siteverify` client.
//!
//! Reference: https://developers.google.com/recaptcha/docs/verify

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{error, info, warn};

use super::{passes_threshold, BotVerifier, CaptchaError};
use crate::Config;

/// Error codes meaning our side of the exchange is broken.
const SECRET_ERROR_CODES: &[&str] = &["missing-input-secret", "invalid-input-secret"];

/// Verifies tokens against the reCAPTCHA `siteverify` endpoint.
pub struct RecaptchaVerifier {
    client: Client,
    verify_url: String,
    secret: String,
    min_score: f64,
}

#[derive(Debug, Deserialize)]
struct SiteVerifyResponse {
    success: bool,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    hostname: Option<String>,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

impl RecaptchaVerifier {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            verify_url: config.recaptcha_verify_url.clone(),
            secret: config.recaptcha_secret.clone(),
            min_score: config.recaptcha_min_score,
        }
    }
}

#[async_trait]
impl BotVerifier for RecaptchaVerifier {
    async fn verify(&self, token: &str) -> Result<(), CaptchaError> {
        let response = self
            .client
            .post(&self.verify_url)
            .form(&[("secret", self.secret.as_str()), ("response", token)])
            .send()
            .await
            .map_err(|e| {
                error!(
                    endpoint = %self.verify_url,
                    is_timeout = e.is_timeout(),
                    error = %e,
                    "captcha_verify_transport_error"
                );
                CaptchaError::Transport(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            error!(
                endpoint = %self.verify_url,
                status_code = status.as_u16(),
                "captcha_verify_bad_status"
            );
            return Err(CaptchaError::UpstreamStatus(status));
        }

        let body: SiteVerifyResponse = response.json().await.map_err(|e| {
            error!(endpoint = %self.verify_url, error = %e, "captcha_verify_malformed_response");
            CaptchaError::MalformedResponse(e)
        })?;

        if body
            .error_codes
            .iter()
            .any(|code| SECRET_ERROR_CODES.contains(&code.as_str()))
        {
            error!(error_codes = ?body.error_codes, "captcha_secret_rejected");
            return Err(CaptchaError::Misconfigured(body.error_codes));
        }

        if !passes_threshold(body.success, body.score, self.min_score) {
            warn!(
                success = body.success,
                score = ?body.score,
                min_score = self.min_score,
                error_codes = ?body.error_codes,
                "captcha_rejected"
            );
            return Err(CaptchaError::Rejected { score: body.score });
        }

        info!(
            score = ?body.score,
            action = ?body.action,
            hostname = ?body.hostname,
            "captcha_passed"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, response::IntoResponse, routing::post, Form, Json, Router};
    use serde_json::json;
    use std::collections::HashMap;
    use tokio::net::TcpListener;

    const SECRET: &str = "server-secret";

    /// Fake siteverify endpoint keyed on the submitted token.
    async fn siteverify(Form(form): Form<HashMap<String, String>>) -> axum::response::Response {
        if form.get("secret").map(String::as_str) != Some(SECRET) {
            return Json(json!({
                "success": false,
                "error-codes": ["invalid-input-secret"]
            }))
            .into_response();
        }

        match form.get("response").map(String::as_str) {
            Some("human") => {
                Json(json!({"success": true, "score": 0.9, "action": "contact"})).into_response()
            }
            Some("bot") => Json(json!({"success": true, "score": 0.3})).into_response(),
            Some("borderline") => Json(json!({"success": true, "score": 0.5})).into_response(),
            Some("no-score") => Json(json!({"success": true})).into_response(),
            Some("garbage") => "definitely not json".into_response(),
            Some("unavailable") => StatusCode::SERVICE_UNAVAILABLE.into_response(),
            _ => Json(json!({
                "success": false,
                "error-codes": ["invalid-input-response"]
            }))
            .into_response(),
        }
    }

    async fn spawn_fake_verifier() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().route("/siteverify", post(siteverify));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/siteverify")
    }

    fn verifier(url: String, secret: &str) -> RecaptchaVerifier {
        RecaptchaVerifier {
            client: Client::new(),
            verify_url: url,
            secret: secret.to_string(),
            min_score: 0.5,
        }
    }

    #[tokio::test]
    async fn test_high_score_passes() {
        let url = spawn_fake_verifier().await;

        let result = verifier(url, SECRET).verify("human").await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_low_score_is_rejected() {
        let url = spawn_fake_verifier().await;

        let result = verifier(url, SECRET).verify("bot").await;

        assert!(matches!(result, Err(CaptchaError::Rejected { score: Some(s) }) if s == 0.3));
    }

    #[tokio::test]
    async fn test_score_equal_to_threshold_is_rejected() {
        let url = spawn_fake_verifier().await;

        let result = verifier(url, SECRET).verify("borderline").await;

        assert!(matches!(result, Err(CaptchaError::Rejected { .. })));
    }

    #[tokio::test]
    async fn test_unsuccessful_response_is_rejected() {
        let url = spawn_fake_verifier().await;

        let result = verifier(url, SECRET).verify("forged").await;

        let err = result.unwrap_err();
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn test_missing_score_is_rejected() {
        let url = spawn_fake_verifier().await;

        let result = verifier(url, SECRET).verify("no-score").await;

        assert!(matches!(result, Err(CaptchaError::Rejected { score: None })));
    }

    #[tokio::test]
    async fn test_wrong_secret_is_server_error() {
        let url = spawn_fake_verifier().await;

        let err = verifier(url, "wrong").verify("human").await.unwrap_err();

        assert!(matches!(err, CaptchaError::Misconfigured(_)));
        assert!(!err.is_client_error());
    }

    #[tokio::test]
    async fn test_unreadable_body_is_server_error() {
        let url = spawn_fake_verifier().await;

        let err = verifier(url, SECRET).verify("garbage").await.unwrap_err();

        assert!(matches!(err, CaptchaError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_bad_status_is_server_error() {
        let url = spawn_fake_verifier().await;

        let err = verifier(url, SECRET).verify("unavailable").await.unwrap_err();

        assert!(matches!(
            err,
            CaptchaError::UpstreamStatus(StatusCode::SERVICE_UNAVAILABLE)
        ));
    }

    #[tokio::test]
    async fn test_unreachable_verifier_is_server_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = verifier(format!("http://{addr}/siteverify"), SECRET)
            .verify("human")
            .await
            .unwrap_err();

        assert!(matches!(err, CaptchaError::Transport(_)));
    }
}

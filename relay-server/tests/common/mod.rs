#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use formrelay::{
    build_router, AppState, BotVerifier, CaptchaError, Config, InMemoryTestimonialStore,
    MailError, Mailer, OutgoingEmail, Relay,
};

pub const BUSINESS: &str = "owner@studio.example";
pub const MODERATOR: &str = "moderator@studio.example";
pub const FROM: &str = "Studio <noreply@studio.example>";
pub const ALLOWED_ORIGIN: &str = "https://studio.example";
pub const PUBLIC_BASE_URL: &str = "https://api.studio.example";
pub const SIGNING_KEY: &str = "approval-signing-key";

// =============================================================================
// Fake bot verifier
// =============================================================================

#[derive(Debug, Clone, Copy)]
pub enum Verdict {
    Pass,
    Reject,
    Unavailable,
}

pub struct FakeVerifier {
    verdict: Verdict,
    calls: AtomicUsize,
    tokens: Mutex<Vec<String>>,
}

impl FakeVerifier {
    pub fn new(verdict: Verdict) -> Self {
        Self {
            verdict,
            calls: AtomicUsize::new(0),
            tokens: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn tokens(&self) -> Vec<String> {
        self.tokens.lock().unwrap().clone()
    }
}

#[async_trait]
impl BotVerifier for FakeVerifier {
    async fn verify(&self, token: &str) -> Result<(), CaptchaError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tokens.lock().unwrap().push(token.to_string());
        match self.verdict {
            Verdict::Pass => Ok(()),
            Verdict::Reject => Err(CaptchaError::Rejected { score: Some(0.3) }),
            Verdict::Unavailable => Err(CaptchaError::UpstreamStatus(
                reqwest::StatusCode::SERVICE_UNAVAILABLE,
            )),
        }
    }
}

// =============================================================================
// Recording mailer
// =============================================================================

/// Records every send attempt. Optionally fails the n-th attempt (1-based).
pub struct RecordingMailer {
    attempts: Mutex<Vec<OutgoingEmail>>,
    fail_attempt: Option<usize>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self {
            attempts: Mutex::new(Vec::new()),
            fail_attempt: None,
        }
    }

    pub fn failing_on(attempt: usize) -> Self {
        Self {
            attempts: Mutex::new(Vec::new()),
            fail_attempt: Some(attempt),
        }
    }

    pub fn attempts(&self) -> Vec<OutgoingEmail> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<String, MailError> {
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            attempts.push(email.clone());
            attempts.len()
        };
        if self.fail_attempt == Some(attempt) {
            return Err(MailError::Rejected {
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                body: "provider exploded".to_string(),
            });
        }
        Ok(format!("email-{attempt}"))
    }
}

// =============================================================================
// Configuration
// =============================================================================

pub fn config_with(overrides: &[(&'static str, &'static str)]) -> Config {
    let mut vars: HashMap<&str, &str> = HashMap::from([
        ("RESEND_API_KEY", "re_test"),
        ("RECAPTCHA_SECRET_KEY", "captcha-secret"),
        ("MAIL_FROM", FROM),
        ("CONTACT_RECIPIENT", BUSINESS),
        ("SITE_NAME", "Studio"),
    ]);
    vars.extend(overrides.iter().copied());
    Config::from_lookup(|name| vars.get(name).map(|v| v.to_string())).unwrap()
}

pub fn default_config() -> Config {
    config_with(&[])
}

// =============================================================================
// Harness
// =============================================================================

pub struct Harness {
    pub app: Router,
    pub relay: Relay,
    pub verifier: Arc<FakeVerifier>,
    pub mailer: Arc<RecordingMailer>,
}

impl Harness {
    pub fn new(config: Config, verdict: Verdict, mailer: RecordingMailer) -> Self {
        let verifier = Arc::new(FakeVerifier::new(verdict));
        let mailer = Arc::new(mailer);
        let store = Arc::new(InMemoryTestimonialStore::new());
        let state = AppState::new(config, verifier.clone(), mailer.clone(), store);
        Self {
            relay: state.relay.clone(),
            app: build_router(state),
            verifier,
            mailer,
        }
    }

    pub fn passing(config: Config) -> Self {
        Self::new(config, Verdict::Pass, RecordingMailer::new())
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
        TestResponse {
            status,
            headers,
            body,
        }
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

// =============================================================================
// Requests
// =============================================================================

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn with_origin(mut request: Request<Body>, origin: &str) -> Request<Body> {
    request
        .headers_mut()
        .insert(header::ORIGIN, origin.parse().unwrap());
    request
}

pub fn preflight(uri: &str, origin: &str) -> Request<Body> {
    Request::builder()
        .method(Method::OPTIONS)
        .uri(uri)
        .header(header::ORIGIN, origin)
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap()
}

pub fn contact_payload() -> Value {
    serde_json::json!({
        "Name": "Ada Lovelace",
        "email": "ada@example.com",
        "phone": "07700 900123",
        "message": "Could you play at our wedding in June",
        "recaptchaToken": "token-from-browser"
    })
}

pub fn testimonial_payload(name: &str) -> Value {
    serde_json::json!({
        "name": name,
        "location": "Leeds",
        "review": "Absolutely wonderful",
        "rating": 5,
        "recaptchaToken": "token-from-browser"
    })
}

/// Pull the approval link out of a moderation email and make it relative.
pub fn approval_path(email: &OutgoingEmail) -> String {
    let start = email.html.find("href=\"").expect("approval link") + "href=\"".len();
    let end = email.html[start..].find('"').unwrap() + start;
    email.html[start..end]
        .replace("&amp;", "&")
        .trim_start_matches(PUBLIC_BASE_URL)
        .to_string()
}

//! Common test utilities for server integration tests

use std::sync::{Arc, RwLock};

use axum_test::TestServer;
use chrono::Duration;
use serde_json::json;

use mailgate_server::{routes, AppState, Config, EmailSender};

/// Mock email sender that captures login codes
#[derive(Default, Clone)]
pub struct MockEmailSender {
    /// Captured (email, code) pairs
    pub sent: Arc<RwLock<Vec<(String, String)>>>,
}

impl MockEmailSender {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Get the last login code sent to an email
    pub fn get_code(&self, email: &str) -> Option<String> {
        self.sent
            .read()
            .unwrap()
            .iter()
            .rev()
            .find(|(e, _)| e == email)
            .map(|(_, c)| c.clone())
    }
}

impl EmailSender for MockEmailSender {
    fn send_passcode(&self, email: &str, code: &str, _ttl_seconds: u64) -> Result<(), String> {
        self.sent
            .write()
            .unwrap()
            .push((email.to_string(), code.to_string()));
        Ok(())
    }
}

/// Email sender that simulates a delivery outage
pub struct FailingEmailSender;

impl EmailSender for FailingEmailSender {
    fn send_passcode(&self, _email: &str, _code: &str, _ttl_seconds: u64) -> Result<(), String> {
        Err("connection refused".to_string())
    }
}

pub fn test_config() -> Config {
    Config {
        port: 0,
        auth_secret: "integration-test-secret".to_string(),
        allowed_emails: Vec::new(),
        otp_ttl: Duration::seconds(600),
        otp_resend_cooldown: Duration::seconds(60),
        otp_max_attempts: 5,
        session_ttl: Duration::days(30),
        smtp: None,
    }
}

/// Create a test server with mock email sender
pub fn create_test_server() -> (TestServer, MockEmailSender) {
    create_test_server_with_config(test_config())
}

pub fn create_test_server_with_config(config: Config) -> (TestServer, MockEmailSender) {
    let email_sender = MockEmailSender::new();
    let state = Arc::new(AppState::new(&config, email_sender.clone()));
    let server = TestServer::new(routes::create_router(state)).expect("Failed to create test server");
    (server, email_sender)
}

/// Helper: run the full login flow and return the session token
pub async fn login(server: &TestServer, email_sender: &MockEmailSender, email: &str) -> String {
    let response = server
        .post("/auth/request-code")
        .json(&json!({ "email": email }))
        .await;
    assert_eq!(response.status_code(), 200);

    let code = email_sender.get_code(email).expect("No login code sent");

    let response = server
        .post("/auth/verify-code")
        .json(&json!({ "email": email, "code": code }))
        .await;
    assert_eq!(response.status_code(), 200);

    response.json::<serde_json::Value>()["token"]
        .as_str()
        .expect("No token in response")
        .to_string()
}

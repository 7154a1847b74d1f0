//! Shared fixtures for the HTTP integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use parkingslot_api::api::app_router;
use parkingslot_api::config::{AdminBootstrap, AuthConfig, Config};
use parkingslot_api::database::Database;
use parkingslot_api::services::email_service::{EmailError, EmailSender, OutgoingEmail};
use parkingslot_api::services::user_service::UserService;
use parkingslot_api::state::AppState;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin-password";
pub const FRONTEND: &str = "http://frontend.test";

/// Email sender that keeps every message instead of delivering it.
#[derive(Default)]
pub struct RecordingSender {
    pub sent: Mutex<Vec<OutgoingEmail>>,
}

impl RecordingSender {
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailSender for RecordingSender {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

/// Email sender whose every delivery is rejected by the provider.
pub struct RejectingSender;

#[async_trait]
impl EmailSender for RejectingSender {
    async fn send(&self, _email: &OutgoingEmail) -> Result<(), EmailError> {
        Err(EmailError::Permanent(
            "550 mailbox unavailable at smtp.internal.test".to_string(),
        ))
    }
}

pub struct TestApp<S = RecordingSender> {
    pub router: Router,
    pub state: AppState,
    pub mailer: Arc<S>,
}

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        max_connections: 1,
        acquire_timeout_seconds: 5,
        server_port: 0,
        frontend_base_url: FRONTEND.to_string(),
        max_page_size: 20,
        auth: AuthConfig {
            jwt_secret: "integration-test-secret-0123456789".to_string(),
            session_token_ttl: Duration::from_secs(7 * 24 * 3600),
            reset_token_ttl: Duration::from_secs(24 * 3600),
            bcrypt_cost: 4,
        },
        email: None,
        admin: Some(AdminBootstrap {
            username: ADMIN_USERNAME.to_string(),
            password: ADMIN_PASSWORD.to_string(),
            email: "admin@parkingslot.test".to_string(),
        }),
    }
}

/// Builds the application on a fresh in-memory database with the admin
/// account already bootstrapped.
pub async fn create_test_app() -> TestApp {
    create_test_app_with_mailer(Arc::new(RecordingSender::default())).await
}

pub async fn create_test_app_with_mailer<S: EmailSender + 'static>(mailer: Arc<S>) -> TestApp<S> {
    let config = test_config();
    let db = Database::new(&config).await.unwrap();
    db.migrate().await.unwrap();

    let admin = config.admin.clone().unwrap();
    UserService::new(db.pool(), config.auth.bcrypt_cost)
        .ensure_admin(&admin)
        .await
        .unwrap();

    let state = AppState::new(db.pool().clone(), config, mailer.clone());

    TestApp {
        router: app_router(state.clone()),
        state,
        mailer,
    }
}

/// Pulls `(user_id, token)` out of the reset link in an email body.
pub fn reset_link_parts(email: &OutgoingEmail) -> (String, String) {
    let marker = format!("{FRONTEND}/resetpassword/");
    let start = email.text_body.find(&marker).unwrap() + marker.len();
    let link = email.text_body[start..].lines().next().unwrap();
    let (id, token) = link.split_once('/').unwrap();
    (id.to_string(), token.to_string())
}

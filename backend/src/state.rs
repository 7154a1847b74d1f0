//! Shared, immutable application state handed to every handler.

use crate::config::Config;
use crate::services::email_service::EmailSender;
use crate::utils::jwt::JwtUtils;
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<Config>,
    pub jwt: Arc<JwtUtils>,
    pub mailer: Arc<dyn EmailSender>,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: Config, mailer: Arc<dyn EmailSender>) -> Self {
        let jwt = Arc::new(JwtUtils::new(&config.auth));
        Self {
            pool,
            config: Arc::new(config),
            jwt,
            mailer,
        }
    }
}

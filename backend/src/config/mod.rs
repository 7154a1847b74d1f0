//! Central module for application-wide configuration settings.
//!
//! Configuration is read once at startup from environment variables (and an
//! optional `.env` file) and is immutable afterwards. Components receive the
//! pieces they need by reference when they are constructed.

use anyhow::{Context, Result, bail};
use std::env;
use std::time::Duration;

/// Hard upper bound for list page sizes.
pub const DEFAULT_MAX_PAGE_SIZE: u32 = 20;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
    pub server_port: u16,
    /// Base URL of the single-page frontend, used to build reset links.
    pub frontend_base_url: String,
    pub max_page_size: u32,
    pub auth: AuthConfig,
    pub email: Option<EmailConfig>,
    pub admin: Option<AdminBootstrap>,
}

/// Token signing and password hashing settings.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub session_token_ttl: Duration,
    pub reset_token_ttl: Duration,
    pub bcrypt_cost: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EmailProvider {
    SendGrid {
        api_key: String,
        api_url: String,
    },
    Smtp {
        host: String,
        port: u16,
        username: String,
        password: String,
    },
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub provider: EmailProvider,
    pub from_email: String,
    pub from_name: String,
    pub timeout: Duration,
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

/// Credentials for an administrator account created at startup if missing.
#[derive(Debug, Clone)]
pub struct AdminBootstrap {
    pub username: String,
    pub password: String,
    pub email: String,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL not set")?;

        let max_connections = parse_var("DB_MAX_CONNECTIONS", 5u32)
            .context("DB_MAX_CONNECTIONS must be a valid number")?;

        let acquire_timeout_seconds = parse_var("DB_ACQUIRE_TIMEOUT_SECONDS", 3u64)
            .context("DB_ACQUIRE_TIMEOUT_SECONDS must be a valid number")?;

        let server_port =
            parse_var("SERVER_PORT", 3000u16).context("SERVER_PORT must be a valid number")?;

        let frontend_base_url = env::var("FRONTEND_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8080".to_string())
            .trim_end_matches('/')
            .to_string();

        let max_page_size = parse_var("MAX_PAGE_SIZE", DEFAULT_MAX_PAGE_SIZE)
            .context("MAX_PAGE_SIZE must be a valid number")?;
        if max_page_size == 0 || max_page_size > DEFAULT_MAX_PAGE_SIZE {
            bail!("MAX_PAGE_SIZE must be between 1 and {DEFAULT_MAX_PAGE_SIZE}");
        }

        Ok(Config {
            database_url,
            max_connections,
            acquire_timeout_seconds,
            server_port,
            frontend_base_url,
            max_page_size,
            auth: AuthConfig::from_env()?,
            email: EmailConfig::from_env()?,
            admin: AdminBootstrap::from_env(),
        })
    }

    /// Returns the email settings, if email delivery is configured.
    pub fn email_config(&self) -> Option<&EmailConfig> {
        self.email.as_ref()
    }
}

impl AuthConfig {
    fn from_env() -> Result<Self> {
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET not set")?;
        if jwt_secret.len() < 16 {
            bail!("JWT_SECRET must be at least 16 characters long");
        }

        let session_days = parse_var("SESSION_TOKEN_TTL_DAYS", 7u64)
            .context("SESSION_TOKEN_TTL_DAYS must be a valid number")?;

        let reset_hours = parse_var("RESET_TOKEN_TTL_HOURS", 24u64)
            .context("RESET_TOKEN_TTL_HOURS must be a valid number")?;

        let bcrypt_cost = parse_var("BCRYPT_COST", bcrypt::DEFAULT_COST)
            .context("BCRYPT_COST must be a valid number")?;

        if session_days == 0 || reset_hours == 0 {
            bail!("token lifetimes must be greater than zero");
        }

        Ok(AuthConfig {
            jwt_secret,
            session_token_ttl: Duration::from_secs(session_days * 24 * 60 * 60),
            reset_token_ttl: Duration::from_secs(reset_hours * 60 * 60),
            bcrypt_cost,
        })
    }
}

impl EmailConfig {
    /// Reads email settings. Returns `None` when `EMAIL_PROVIDER` is unset.
    fn from_env() -> Result<Option<Self>> {
        let provider = match env::var("EMAIL_PROVIDER") {
            Ok(provider) => provider.to_lowercase(),
            Err(_) => return Ok(None),
        };

        let provider = match provider.as_str() {
            "sendgrid" => EmailProvider::SendGrid {
                api_key: env::var("SENDGRID_API_KEY").context("SENDGRID_API_KEY not set")?,
                api_url: env::var("SENDGRID_API_URL")
                    .unwrap_or_else(|_| "https://api.sendgrid.com/v3/mail/send".to_string()),
            },
            "smtp" => EmailProvider::Smtp {
                host: env::var("SMTP_HOST").context("SMTP_HOST not set")?,
                port: parse_var("SMTP_PORT", 587u16).context("SMTP_PORT must be a valid number")?,
                username: env::var("SMTP_USERNAME").context("SMTP_USERNAME not set")?,
                password: env::var("SMTP_PASSWORD").context("SMTP_PASSWORD not set")?,
            },
            other => bail!("unsupported EMAIL_PROVIDER '{other}', expected 'sendgrid' or 'smtp'"),
        };

        let from_email = env::var("EMAIL_FROM").context("EMAIL_FROM not set")?;
        let from_name = env::var("EMAIL_FROM_NAME").unwrap_or_else(|_| "ParkingSlot".to_string());

        let timeout_seconds = parse_var("EMAIL_TIMEOUT_SECONDS", 10u64)
            .context("EMAIL_TIMEOUT_SECONDS must be a valid number")?;
        let max_attempts = parse_var("EMAIL_MAX_ATTEMPTS", 3u32)
            .context("EMAIL_MAX_ATTEMPTS must be a valid number")?;
        let initial_backoff_ms = parse_var("EMAIL_INITIAL_BACKOFF_MS", 250u64)
            .context("EMAIL_INITIAL_BACKOFF_MS must be a valid number")?;

        Ok(Some(EmailConfig {
            provider,
            from_email,
            from_name,
            timeout: Duration::from_secs(timeout_seconds),
            max_attempts: max_attempts.max(1),
            initial_backoff: Duration::from_millis(initial_backoff_ms),
        }))
    }
}

impl AdminBootstrap {
    fn from_env() -> Option<Self> {
        let username = env::var("ADMIN_USERNAME").ok()?;
        let password = env::var("ADMIN_PASSWORD").ok()?;
        let email = env::var("ADMIN_EMAIL").unwrap_or_else(|_| format!("{username}@localhost"));

        Some(AdminBootstrap {
            username,
            password,
            email,
        })
    }
}

fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(value) => Ok(value.trim().parse::<T>()?),
        Err(_) => Ok(default),
    }
}

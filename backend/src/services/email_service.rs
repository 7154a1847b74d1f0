//! Outbound email delivery.
//!
//! `EmailSender` is implemented by the SendGrid HTTP API client and by an
//! SMTP transport. `RetryingSender` wraps either one with a per-attempt
//! timeout and bounded exponential backoff for transient failures.

use crate::config::{EmailConfig, EmailProvider};
use crate::errors::ServiceError;
use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart, SinglePart, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use rand::Rng;
use serde_json::json;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EmailError {
    /// Worth retrying: timeouts, connection failures, 5xx and 429 replies.
    #[error("transient email failure: {0}")]
    Transient(String),
    /// Retrying cannot help: bad addresses, rejected credentials, 4xx replies.
    #[error("email rejected: {0}")]
    Permanent(String),
    #[error("email delivery is not configured")]
    NotConfigured,
}

impl From<EmailError> for ServiceError {
    fn from(error: EmailError) -> Self {
        ServiceError::external_service(error.to_string())
    }
}

/// A fully rendered message.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError>;
}

/// Builds the sender described by the configuration, or a sender that always
/// fails with `NotConfigured` when email is disabled.
pub fn build_sender(config: Option<&EmailConfig>) -> Result<Arc<dyn EmailSender>, ServiceError> {
    let Some(config) = config else {
        tracing::warn!("Email configuration not found. Password reset emails will fail.");
        return Ok(Arc::new(DisabledSender));
    };

    let inner: Box<dyn EmailSender> = match &config.provider {
        EmailProvider::SendGrid { api_key, api_url } => Box::new(SendGridSender::new(
            api_key.clone(),
            api_url.clone(),
            config.from_email.clone(),
            config.from_name.clone(),
        )?),
        EmailProvider::Smtp {
            host,
            port,
            username,
            password,
        } => Box::new(SmtpSender::new(
            host,
            *port,
            username.clone(),
            password.clone(),
            &config.from_email,
            &config.from_name,
        )?),
    };

    tracing::info!("Email service initialized successfully");
    Ok(Arc::new(RetryingSender::new(
        inner,
        RetryPolicy {
            timeout: config.timeout,
            max_attempts: config.max_attempts,
            initial_backoff: config.initial_backoff,
        },
    )))
}

struct DisabledSender;

#[async_trait]
impl EmailSender for DisabledSender {
    async fn send(&self, _email: &OutgoingEmail) -> Result<(), EmailError> {
        Err(EmailError::NotConfigured)
    }
}

/// SendGrid v3 `mail/send` client.
pub struct SendGridSender {
    http_client: reqwest::Client,
    api_key: String,
    api_url: String,
    from_email: String,
    from_name: String,
}

impl SendGridSender {
    pub fn new(
        api_key: String,
        api_url: String,
        from_email: String,
        from_name: String,
    ) -> Result<Self, ServiceError> {
        let http_client = reqwest::Client::builder()
            .user_agent("ParkingSlot/1.0")
            .build()
            .map_err(|e| ServiceError::internal_error(format!("HTTP client error: {e}")))?;

        Ok(Self {
            http_client,
            api_key,
            api_url,
            from_email,
            from_name,
        })
    }

    fn payload(&self, email: &OutgoingEmail) -> serde_json::Value {
        json!({
            "personalizations": [{ "to": [{ "email": email.to }] }],
            "from": { "email": self.from_email, "name": self.from_name },
            "subject": email.subject,
            "content": [
                { "type": "text/plain", "value": email.text_body },
                { "type": "text/html", "value": email.html_body }
            ],
            "tracking_settings": {
                "click_tracking": { "enable": false, "enable_text": false }
            }
        })
    }
}

#[async_trait]
impl EmailSender for SendGridSender {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError> {
        let response = self
            .http_client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&self.payload(email))
            .send()
            .await
            .map_err(|e| EmailError::Transient(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let message = format!("SendGrid returned {status}: {body}");
        if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            Err(EmailError::Transient(message))
        } else {
            Err(EmailError::Permanent(message))
        }
    }
}

/// SMTP relay transport.
pub struct SmtpSender {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpSender {
    pub fn new(
        host: &str,
        port: u16,
        username: String,
        password: String,
        from_email: &str,
        from_name: &str,
    ) -> Result<Self, ServiceError> {
        let creds = Credentials::new(username, password);

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .map_err(|e| ServiceError::validation(format!("Invalid SMTP host: {e}")))?
            .port(port)
            .credentials(creds)
            .build();

        let from = Mailbox::from_str(&format!("{from_name} <{from_email}>"))
            .map_err(|e| ServiceError::validation(format!("Invalid from email: {e}")))?;

        Ok(Self { mailer, from })
    }
}

#[async_trait]
impl EmailSender for SmtpSender {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError> {
        let to_mailbox = Mailbox::from_str(&email.to)
            .map_err(|e| EmailError::Permanent(format!("Invalid recipient email: {e}")))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to_mailbox)
            .subject(email.subject.as_str())
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(email.text_body.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(email.html_body.clone()),
                    ),
            )
            .map_err(|e| EmailError::Permanent(format!("Failed to build email: {e}")))?;

        self.mailer.send(message).await.map_err(|e| {
            if e.is_permanent() {
                EmailError::Permanent(e.to_string())
            } else {
                EmailError::Transient(e.to_string())
            }
        })?;

        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub timeout: Duration,
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based): doubles each time,
    /// plus up to 50% random jitter.
    fn backoff(&self, attempt: u32) -> Duration {
        let base = self
            .initial_backoff
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)));
        let jitter_ms = (base.as_millis() as u64) / 2;
        if jitter_ms == 0 {
            return base;
        }
        base + Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
    }
}

/// Wraps a sender with a per-attempt timeout and retries on transient errors.
pub struct RetryingSender {
    inner: Box<dyn EmailSender>,
    policy: RetryPolicy,
}

impl RetryingSender {
    pub fn new(inner: Box<dyn EmailSender>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl EmailSender for RetryingSender {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let result = match tokio::time::timeout(self.policy.timeout, self.inner.send(email))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(EmailError::Transient(format!(
                    "timed out after {:?}",
                    self.policy.timeout
                ))),
            };

            match result {
                Ok(()) => return Ok(()),
                Err(EmailError::Transient(reason)) if attempt < max_attempts => {
                    let delay = self.policy.backoff(attempt);
                    tracing::warn!(
                        "Email to {} failed (attempt {}/{}): {}. Retrying in {:?}",
                        email.to,
                        attempt,
                        max_attempts,
                        reason,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(
                        "Email to {} failed after {} attempt(s): {}",
                        email.to,
                        attempt,
                        e
                    );
                    return Err(e);
                }
            }
        }
    }
}

/// Renders the password reset message for `reset_url`, which stays valid
/// for `link_lifetime`.
pub fn password_reset_email(
    to: &str,
    recipient_name: &str,
    reset_url: &str,
    link_lifetime: Duration,
) -> OutgoingEmail {
    let lifetime = describe_lifetime(link_lifetime);
    let html_name = escape_html(recipient_name);
    let html_body = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>Reset your ParkingSlot password</title>
</head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
        <h2 style="color: #2c3e50;">Password reset</h2>
        <p>Hi {html_name},</p>
        <p>We received a request to reset your ParkingSlot password.</p>
        <div style="text-align: center; margin: 30px 0;">
            <a href="{reset_url}"
               style="background-color: #3498db; color: white; padding: 12px 30px;
                      text-decoration: none; border-radius: 5px; display: inline-block;">
                Reset password
            </a>
        </div>
        <p>Or copy and paste this link into your browser:</p>
        <p style="word-break: break-all; color: #7f8c8d;">{reset_url}</p>
        <p style="font-size: 12px; color: #7f8c8d;">
            This link expires in {lifetime}. If you did not ask for a reset, you can ignore this email.
        </p>
    </div>
</body>
</html>"#
    );

    let text_body = format!(
        "Hi {recipient_name},\n\nWe received a request to reset your ParkingSlot password.\n\n\
         Open the link below to choose a new one:\n{reset_url}\n\n\
         This link expires in {lifetime}. If you did not ask for a reset, you can ignore this email.\n"
    );

    OutgoingEmail {
        to: to.to_string(),
        subject: "ParkingSlot Password Reset Link".to_string(),
        html_body,
        text_body,
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn describe_lifetime(lifetime: Duration) -> String {
    let minutes = lifetime.as_secs() / 60;
    match (minutes / 60, minutes % 60) {
        (1, 0) => "1 hour".to_string(),
        (hours, 0) if hours > 0 => format!("{hours} hours"),
        (_, _) if minutes == 1 => "1 minute".to_string(),
        _ => format!("{minutes} minutes"),
    }
}

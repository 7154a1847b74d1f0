//! Core business logic for the authentication and password reset flows.
//!
//! Login issues a session token. Forgot-password issues a short-lived token
//! and emails a link that embeds it. Any password change bumps the user's
//! token version, which retires every token issued before it.

use crate::api::user::models::UserDto;
use crate::auth::models::*;
use crate::config::Config;
use crate::database::models::User;
use crate::errors::{ServiceError, ServiceResult};
use crate::services::email_service::{EmailSender, password_reset_email};
use crate::services::user_service::UserService;
use crate::state::AppState;
use crate::utils::jwt::{Claims, JwtUtils};
use sqlx::SqlitePool;
use validator::Validate;

const INVALID_CREDENTIALS: &str = "Username or password is incorrect";
const INVALID_RESET_REQUEST: &str = "Invalid password reset request.";

/// Authentication service for login, token checks and password resets
pub struct AuthService<'a> {
    jwt: &'a JwtUtils,
    config: &'a Config,
    mailer: &'a dyn EmailSender,
    user_service: UserService<'a>,
}

impl<'a> AuthService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self::from_parts(&state.pool, &state.jwt, &state.config, state.mailer.as_ref())
    }

    pub fn from_parts(
        pool: &'a SqlitePool,
        jwt: &'a JwtUtils,
        config: &'a Config,
        mailer: &'a dyn EmailSender,
    ) -> Self {
        Self {
            jwt,
            config,
            mailer,
            user_service: UserService::new(pool, config.auth.bcrypt_cost),
        }
    }

    /// Authenticate user and issue a session token.
    pub async fn authenticate(&self, request: AuthenticateRequest) -> ServiceResult<AuthenticatedUser> {
        request.validate()?;

        let user = self
            .user_service
            .authenticate(&request.username, &request.password)
            .await?
            .ok_or_else(|| ServiceError::invalid_operation(INVALID_CREDENTIALS))?;

        let token = self.jwt.issue(
            &user.id,
            user.role,
            user.token_version,
            self.config.auth.session_token_ttl,
        )?;

        tracing::info!("User {} authenticated", user.id);
        Ok(AuthenticatedUser {
            user: UserDto::from(user),
            token,
        })
    }

    /// Emails a password reset link to the owner of `email`.
    pub async fn forgot_password(&self, request: ForgotPasswordRequest) -> ServiceResult<()> {
        let user = self
            .user_service
            .get_user_by_email(request.email.trim())
            .await?
            .ok_or_else(|| {
                ServiceError::invalid_operation("Cannot find user. Please check the email.")
            })?;

        let token = self.jwt.issue(
            &user.id,
            user.role,
            user.token_version,
            self.config.auth.reset_token_ttl,
        )?;
        let reset_url = format!(
            "{}/resetpassword/{}/{}",
            self.config.frontend_base_url, user.id, token
        );

        let display_name = if user.first_name.is_empty() {
            user.username.as_str()
        } else {
            user.first_name.as_str()
        };
        let email = password_reset_email(
            &user.email,
            display_name,
            &reset_url,
            self.config.auth.reset_token_ttl,
        );

        self.mailer.send(&email).await.map_err(|e| {
            tracing::error!("Failed to send reset email for user {}: {}", user.id, e);
            ServiceError::external_service("Failed to send reset password email.")
        })?;

        tracing::info!("Password reset email sent for user {}", user.id);
        Ok(())
    }

    /// Changes the password of a user who can prove the current one.
    pub async fn reset_password(&self, request: ResetPasswordRequest) -> ServiceResult<()> {
        let username = request
            .username
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ServiceError::invalid_operation("Please provide a username."))?;

        request.validate()?;

        let user = self
            .user_service
            .authenticate(username, &request.old_password)
            .await?
            .ok_or_else(|| ServiceError::invalid_operation("Incorrect current password entered."))?;

        self.user_service
            .update_password(&user.id, &request.new_password)
            .await
    }

    /// Checks that a token is well formed, signed by us, unexpired, and that
    /// its subject still exists with the same token version.
    pub async fn check_token(&self, request: CheckTokenRequest) -> ServiceResult<Claims> {
        let token = request
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ServiceError::invalid_operation("Need a token."))?;

        let claims = self.jwt.validate(token)?;

        let user = self
            .user_service
            .get_user_required(&claims.sub)
            .await
            .map_err(|e| match e {
                ServiceError::NotFound { .. } => {
                    ServiceError::invalid_operation("The user does not exist in the database.")
                }
                other => other,
            })?;

        Self::ensure_current(&claims, &user)?;
        Ok(claims)
    }

    /// Sets a new password at the end of the emailed reset flow.
    pub async fn confirm_password(&self, request: ConfirmPasswordRequest) -> ServiceResult<()> {
        request.validate()?;

        if !self.user_service.user_exists(&request.id).await? {
            return Err(ServiceError::invalid_operation(INVALID_RESET_REQUEST));
        }

        if let Some(token) = request.token.as_deref() {
            let claims = self
                .jwt
                .validate(token)
                .map_err(|_| ServiceError::invalid_operation(INVALID_RESET_REQUEST))?;
            let user = self.user_service.get_user_required(&request.id).await?;
            if claims.sub != request.id || Self::ensure_current(&claims, &user).is_err() {
                return Err(ServiceError::invalid_operation(INVALID_RESET_REQUEST));
            }
        }

        self.user_service
            .update_password(&request.id, &request.new_password)
            .await
    }

    fn ensure_current(claims: &Claims, user: &User) -> ServiceResult<()> {
        if claims.ver != user.token_version {
            return Err(ServiceError::invalid_operation(
                "Token is no longer valid. Please request a new one.",
            ));
        }
        Ok(())
    }
}

//! Request and response payloads for authentication and password reset.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::user::models::UserDto;

/// Login request payload
#[derive(Debug, Deserialize, Validate)]
pub struct AuthenticateRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// User details plus the freshly issued session token.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedUser {
    #[serde(flatten)]
    pub user: UserDto,
    pub token: String,
}

/// Any address that matches no account, malformed or not, is a 400.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: String,
}

/// Change of password by a user who knows the current one.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub username: Option<String>,

    #[serde(default)]
    pub old_password: String,

    #[validate(length(
        min = 6,
        max = 128,
        message = "Password must be between 6 and 128 characters"
    ))]
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct CheckTokenRequest {
    pub token: Option<String>,
}

/// Completion of the emailed reset flow.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPasswordRequest {
    #[validate(length(min = 1, message = "User ID is required"))]
    pub id: String,

    #[validate(length(
        min = 6,
        max = 128,
        message = "Password must be between 6 and 128 characters"
    ))]
    pub new_password: String,

    /// Reset token from the emailed link. When present it must belong to `id`.
    pub token: Option<String>,
}

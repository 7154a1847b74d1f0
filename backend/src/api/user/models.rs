//! API shapes for user resources.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::database::models::{Role, UpdateUser, User};
use crate::services::user_service::NewUser;

/// Public view of a user. Never includes the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub phone_number: String,
    pub role: Role,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            username: user.username,
            email: user.email,
            phone_number: user.phone_number,
            role: user.role,
        }
    }
}

/// Registration payload. New accounts always get the `User` role.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserRequest {
    #[serde(default)]
    #[validate(length(max = 100, message = "First name is too long"))]
    pub first_name: String,

    #[serde(default)]
    #[validate(length(max = 100, message = "Last name is too long"))]
    pub last_name: String,

    #[validate(length(
        min = 1,
        max = 255,
        message = "Username must be between 1-255 characters"
    ))]
    pub username: String,

    #[validate(length(
        min = 6,
        max = 128,
        message = "Password must be between 6 and 128 characters"
    ))]
    pub password: String,

    #[validate(
        email(message = "Must be a valid email"),
        length(max = 255, message = "Email too long")
    )]
    pub email: String,

    #[serde(default)]
    #[validate(length(max = 32, message = "Phone number is too long"))]
    pub phone_number: String,
}

impl From<RegisterUserRequest> for NewUser {
    fn from(request: RegisterUserRequest) -> Self {
        Self {
            first_name: request.first_name.trim().to_string(),
            last_name: request.last_name.trim().to_string(),
            username: request.username.trim().to_string(),
            password: request.password,
            email: request.email.trim().to_string(),
            phone_number: request.phone_number.trim().to_string(),
            role: Role::User,
        }
    }
}

/// Full replacement of a user's profile.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(default)]
    #[validate(length(max = 100, message = "First name is too long"))]
    pub first_name: String,

    #[serde(default)]
    #[validate(length(max = 100, message = "Last name is too long"))]
    pub last_name: String,

    #[validate(length(
        min = 1,
        max = 255,
        message = "Username must be between 1-255 characters"
    ))]
    pub username: String,

    #[validate(
        email(message = "Must be a valid email"),
        length(max = 255, message = "Email too long")
    )]
    pub email: String,

    #[serde(default)]
    #[validate(length(max = 32, message = "Phone number is too long"))]
    pub phone_number: String,

    #[validate(length(
        min = 6,
        max = 128,
        message = "Password must be between 6 and 128 characters"
    ))]
    pub password: Option<String>,
}

impl UpdateUserRequest {
    pub fn into_parts(self) -> (UpdateUser, Option<String>) {
        (
            UpdateUser {
                first_name: self.first_name.trim().to_string(),
                last_name: self.last_name.trim().to_string(),
                username: self.username.trim().to_string(),
                email: self.email.trim().to_string(),
                phone_number: self.phone_number.trim().to_string(),
            },
            self.password,
        )
    }
}

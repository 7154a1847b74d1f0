//! Defines the HTTP routes for authentication and password reset.
//!
//! These are merged into the `/users` router, so paths here are relative
//! to it.

use crate::auth::handlers::*;
use axum::{Router, routing::post};

/// Creates the authentication router with all auth-related routes
pub fn auth_router() -> Router {
    Router::new()
        .route("/authenticate", post(authenticate))
        .route("/ForgetPassword", post(forgot_password))
        .route("/ResetPassword", post(reset_password))
        .route("/CheckToken", post(check_token))
        .route("/ConfirmPassword", post(confirm_password))
}

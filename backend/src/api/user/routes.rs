//! Defines the HTTP routes for user registration and management.
//!
//! Listing, lookup and registration are anonymous; updating requires a
//! bearer token and deleting requires an admin token.

use super::handlers::{delete_user, get_user, get_users, register, update_user};
use crate::auth::middleware::{admin_auth, jwt_auth};
use axum::{
    Router, middleware,
    routing::{delete, get, put},
};

pub fn user_router() -> Router {
    Router::new()
        .route("/", get(get_users).post(register))
        .route(
            "/{id}",
            get(get_user)
                .merge(put(update_user).layer(middleware::from_fn(jwt_auth)))
                .merge(
                    delete(delete_user)
                        .layer(middleware::from_fn(admin_auth))
                        .layer(middleware::from_fn(jwt_auth)),
                ),
        )
}

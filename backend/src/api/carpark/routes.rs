//! Defines the HTTP routes for carparks.

use super::handlers::{create_carpark, get_carpark, get_carparks};
use crate::auth::middleware::{admin_auth, jwt_auth};
use axum::{
    Router, middleware,
    routing::{get, post},
};

pub fn carpark_router() -> Router {
    Router::new()
        .route(
            "/",
            get(get_carparks).merge(
                post(create_carpark)
                    .layer(middleware::from_fn(admin_auth))
                    .layer(middleware::from_fn(jwt_auth)),
            ),
        )
        .route("/{id}", get(get_carpark))
}

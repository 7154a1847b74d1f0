//! Central module for organizing the application's HTTP surface.
//!
//! Resource routers live in their own submodules. `app_router` nests them
//! together with the authentication routes and attaches the shared state.

pub mod carpark;
pub mod common;
pub mod user;

use crate::auth::routes::auth_router;
use crate::state::AppState;
use axum::{Extension, Json, Router, routing::get};
use carpark::routes::carpark_router;
use serde_json::{Value, json};
use tower::ServiceBuilder;
use user::routes::user_router;

/// Builds the full application router around `state`.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .nest("/users", auth_router().merge(user_router()))
        .nest("/carparks", carpark_router())
        .layer(ServiceBuilder::new().layer(Extension(state)))
}

async fn root_handler() -> Json<Value> {
    Json(json!({
        "service": "ParkingSlot API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

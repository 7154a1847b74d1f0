//! Module for carpark API endpoints.

pub mod handlers;
pub mod models;
pub mod routes;

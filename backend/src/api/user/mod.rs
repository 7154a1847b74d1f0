//! Module for user API endpoints.
//!
//! This module handles registration, lookup, listing, profile updates and
//! deletion of user accounts.

pub mod handlers;
pub mod models;
pub mod routes;

//! Authentication module for sessions, password resets and access control.
//!
//! This module provides login, token verification, the password reset flow
//! and the authorization middleware used by protected routes.

pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod service;

//! Module for core business logic services.
//!
//! This module encapsulates services that perform specific business operations
//! and orchestrate interactions between repositories, the token utilities and
//! outbound email.

pub mod carpark_service;
pub mod email_service;
pub mod user_service;

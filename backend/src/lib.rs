//! ParkingSlot backend: user accounts, carpark lookups and the password
//! reset flow behind a JSON HTTP API.

pub mod api;
pub mod auth;
pub mod config;
pub mod database;
pub mod errors;
pub mod repositories;
pub mod services;
pub mod state;
pub mod utils;

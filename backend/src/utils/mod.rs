//! Collection of general utility functions shared by services and handlers.
//!
//! Token issuing/validation, pagination and sort-key resolution live here
//! because they are independent of any single resource.

pub mod jwt;
pub mod pagination;
pub mod sort;

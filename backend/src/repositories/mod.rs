//! Data access layer. Each repository borrows the shared SQLite pool and
//! owns the SQL for one table.

pub mod carpark_repository;
pub mod user_repository;

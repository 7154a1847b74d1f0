//! Database repository for user management operations.
//!
//! Provides CRUD operations for system users. Deleted users are kept as
//! soft-deleted rows and are invisible to every query here.

use crate::database::models::{CreateUser, UpdateUser, User};
use crate::utils::pagination::PageRequest;
use crate::utils::sort::{SortClause, USER_SORT_MAPPING};
use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;

const USER_COLUMNS: &str = "id, first_name, last_name, username, password_hash, email, \
    phone_number, role, token_version, created_at, updated_at, is_deleted, deleted_at";

/// Repository for user database operations.
pub struct UserRepository<'a> {
    /// Shared SQLite connection pool
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Creates a new UserRepository instance.
    ///
    /// # Arguments
    /// * `pool` - Reference to SQLite connection pool
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates a new user in the database.
    ///
    /// # Arguments
    /// * `user` - CreateUser row with an already hashed password
    ///
    /// # Returns
    /// The newly created User with all fields populated
    pub async fn create_user(&self, user: CreateUser) -> Result<User> {
        let now = Utc::now();
        let sql = format!(
            "INSERT INTO users (id, first_name, last_name, username, password_hash, email, \
             phone_number, role, token_version, created_at, updated_at, is_deleted) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?, 0) RETURNING {USER_COLUMNS}"
        );

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(user.id)
            .bind(user.first_name)
            .bind(user.last_name)
            .bind(user.username)
            .bind(user.password_hash)
            .bind(user.email)
            .bind(user.phone_number)
            .bind(user.role)
            .bind(now)
            .bind(now)
            .fetch_one(self.pool)
            .await?;

        Ok(user)
    }

    /// Retrieves a user by their unique identifier.
    ///
    /// # Returns
    /// `Some(User)` if found and not deleted, `None` otherwise
    pub async fn get_user_by_id(&self, id: &str) -> Result<Option<User>> {
        self.fetch_one_where("id = ?", id).await
    }

    /// Retrieves a user by their username.
    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.fetch_one_where("username = ?", username).await
    }

    /// Retrieves a user by their email, ignoring case.
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.fetch_one_where("email = ? COLLATE NOCASE", email).await
    }

    async fn fetch_one_where(&self, predicate: &str, value: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {predicate} AND is_deleted = 0");

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(value)
            .fetch_optional(self.pool)
            .await?;

        Ok(user)
    }

    /// Checks whether a live user with this id exists.
    pub async fn user_exists(&self, id: &str) -> Result<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = ? AND is_deleted = 0")
                .bind(id)
                .fetch_one(self.pool)
                .await?;

        Ok(count > 0)
    }

    /// Checks if username exists, optionally excluding a specific user.
    pub async fn username_exists(&self, username: &str, exclude_user_id: Option<&str>) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE username = ? AND id != ? AND is_deleted = 0",
        )
        .bind(username)
        .bind(exclude_user_id.unwrap_or(""))
        .fetch_one(self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Checks if email exists, optionally excluding a specific user.
    pub async fn email_exists(&self, email: &str, exclude_user_id: Option<&str>) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE email = ? COLLATE NOCASE AND id != ? AND is_deleted = 0",
        )
        .bind(email)
        .bind(exclude_user_id.unwrap_or(""))
        .fetch_one(self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Retrieves one page of users in the requested order.
    ///
    /// `sort` must come from `USER_SORT_MAPPING`, which only yields known
    /// column names.
    pub async fn get_users(&self, page: &PageRequest, sort: &[SortClause]) -> Result<Vec<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE is_deleted = 0 ORDER BY {} LIMIT ? OFFSET ?",
            USER_SORT_MAPPING.order_by_sql(sort)
        );

        let users = sqlx::query_as::<_, User>(&sql)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool)
            .await?;

        Ok(users)
    }

    /// Get total count of live users
    pub async fn get_users_count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE is_deleted = 0")
            .fetch_one(self.pool)
            .await?;

        Ok(count as u64)
    }

    /// Replaces the profile fields of a user.
    ///
    /// # Returns
    /// `true` if a live row was updated
    pub async fn update_user(&self, id: &str, update: UpdateUser) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE users SET first_name = ?, last_name = ?, username = ?, email = ?, \
             phone_number = ?, updated_at = ? WHERE id = ? AND is_deleted = 0",
        )
        .bind(update.first_name)
        .bind(update.last_name)
        .bind(update.username)
        .bind(update.email)
        .bind(update.phone_number)
        .bind(Utc::now())
        .bind(id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Stores a new password hash and invalidates previously issued tokens.
    ///
    /// # Returns
    /// `true` if a live row was updated
    pub async fn update_password(&self, id: &str, password_hash: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = ?, token_version = token_version + 1, \
             updated_at = ? WHERE id = ? AND is_deleted = 0",
        )
        .bind(password_hash)
        .bind(Utc::now())
        .bind(id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Soft deletes a user.
    ///
    /// # Returns
    /// `true` if a live row was deleted
    pub async fn delete_user(&self, id: &str) -> Result<bool> {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE users SET is_deleted = 1, deleted_at = ?, updated_at = ? \
             WHERE id = ? AND is_deleted = 0",
        )
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

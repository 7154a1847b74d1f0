//! User business logic service.
//!
//! Handles registration, profile updates, deletion, listing and password
//! verification on top of `UserRepository`.

use crate::config::AdminBootstrap;
use crate::database::models::{CreateUser, Role, UpdateUser, User};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::user_repository::UserRepository;
use crate::utils::pagination::{PageRequest, PagedList};
use crate::utils::sort::USER_SORT_MAPPING;
use bcrypt::{hash, verify};
use sqlx::SqlitePool;
use std::sync::OnceLock;
use uuid::Uuid;

static DUMMY_HASH: OnceLock<String> = OnceLock::new();

/// Input for creating an account, already validated by the caller.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub password: String,
    pub email: String,
    pub phone_number: String,
    pub role: Role,
}

pub struct UserService<'a> {
    /// Shared database connection pool
    pool: &'a SqlitePool,
    bcrypt_cost: u32,
}

impl<'a> UserService<'a> {
    /// Creates a new UserService instance.
    ///
    /// # Arguments
    /// * `pool` - Reference to SQLite connection pool
    /// * `bcrypt_cost` - Work factor used when hashing new passwords
    pub fn new(pool: &'a SqlitePool, bcrypt_cost: u32) -> Self {
        Self { pool, bcrypt_cost }
    }

    /// Creates a new user.
    ///
    /// # Errors
    /// Returns `ServiceError` for:
    /// - Username or email already in use
    /// - Business rule violations
    pub async fn create_user(&self, new_user: NewUser) -> ServiceResult<User> {
        Self::validate_business_rules(&new_user.username)?;

        let repo = UserRepository::new(self.pool);

        if repo.username_exists(&new_user.username, None).await? {
            return Err(ServiceError::already_exists("Username", &new_user.username));
        }
        if repo.email_exists(&new_user.email, None).await? {
            return Err(ServiceError::already_exists("Email", &new_user.email));
        }

        let password_hash = self.hash_password(&new_user.password)?;

        let data = CreateUser {
            id: Uuid::now_v7().to_string(),
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            username: new_user.username,
            password_hash,
            email: new_user.email,
            phone_number: new_user.phone_number,
            role: new_user.role,
        };

        let user = repo.create_user(data).await.map_err(|e| {
            // Lost a race with a concurrent registration
            if e.to_string().contains("UNIQUE constraint failed") {
                ServiceError::invalid_operation("Username or email is already taken")
            } else {
                ServiceError::Database { source: e }
            }
        })?;

        tracing::info!("Created user {} with role {}", user.id, user.role);
        Ok(user)
    }

    /// Creates the configured administrator if no user has that username.
    pub async fn ensure_admin(&self, admin: &AdminBootstrap) -> ServiceResult<()> {
        let repo = UserRepository::new(self.pool);
        if repo.get_user_by_username(&admin.username).await?.is_some() {
            return Ok(());
        }

        self.create_user(NewUser {
            first_name: "Admin".to_string(),
            last_name: String::new(),
            username: admin.username.clone(),
            password: admin.password.clone(),
            email: admin.email.clone(),
            phone_number: String::new(),
            role: Role::Admin,
        })
        .await?;

        tracing::info!("Bootstrapped administrator account '{}'", admin.username);
        Ok(())
    }

    /// Function to hash a password before storing in database
    fn hash_password(&self, password: &str) -> ServiceResult<String> {
        hash(password, self.bcrypt_cost)
            .map_err(|e| ServiceError::internal_error(format!("Password hashing failed: {}", e)))
    }

    /// Function to verify a password against the stored hash
    ///
    /// A hash that cannot be parsed counts as a mismatch.
    fn verify_password(password: &str, hash: &str) -> bool {
        match verify(password, hash) {
            Ok(matches) => matches,
            Err(e) => {
                tracing::warn!("Stored password hash could not be verified: {}", e);
                false
            }
        }
    }

    /// Looks up a user by username and checks the password.
    ///
    /// # Returns
    /// `None` when the user does not exist or the password is wrong; the two
    /// cases are deliberately indistinguishable.
    pub async fn authenticate(&self, username: &str, password: &str) -> ServiceResult<Option<User>> {
        let repo = UserRepository::new(self.pool);
        let Some(user) = repo.get_user_by_username(username).await? else {
            // Unknown usernames cost the same bcrypt work as a wrong password.
            if let Some(dummy) = self.dummy_hash() {
                let _ = Self::verify_password(password, dummy);
            }
            return Ok(None);
        };

        Ok(Self::verify_password(password, &user.password_hash).then_some(user))
    }

    /// Hash compared against on unknown usernames, built once at the
    /// configured cost.
    fn dummy_hash(&self) -> Option<&'static str> {
        if let Some(hash) = DUMMY_HASH.get() {
            return Some(hash.as_str());
        }
        let hash = self.hash_password("parkingslot-dummy-password").ok()?;
        Some(DUMMY_HASH.get_or_init(|| hash).as_str())
    }

    /// Retrieves a user by ID with existence verification.
    ///
    /// # Errors
    /// Returns `ServiceError::NotFound` if user doesn't exist
    pub async fn get_user_required(&self, id: &str) -> ServiceResult<User> {
        let repo = UserRepository::new(self.pool);
        let user = repo
            .get_user_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", id))?;
        Ok(user)
    }

    pub async fn get_user_by_email(&self, email: &str) -> ServiceResult<Option<User>> {
        let repo = UserRepository::new(self.pool);
        Ok(repo.get_user_by_email(email).await?)
    }

    pub async fn user_exists(&self, id: &str) -> ServiceResult<bool> {
        let repo = UserRepository::new(self.pool);
        Ok(repo.user_exists(id).await?)
    }

    /// Returns one page of users ordered by the requested sort key.
    pub async fn list_users(&self, request: &PageRequest) -> ServiceResult<PagedList<User>> {
        let sort = USER_SORT_MAPPING.resolve(request.order_by.as_deref())?;

        let repo = UserRepository::new(self.pool);
        let total = repo.get_users_count().await?;
        let users = repo.get_users(request, &sort).await?;

        Ok(PagedList::new(users, total, request))
    }

    /// Replaces a user's profile and, when given, their password.
    pub async fn update_user(
        &self,
        id: &str,
        update: UpdateUser,
        new_password: Option<&str>,
    ) -> ServiceResult<()> {
        let repo = UserRepository::new(self.pool);
        if !repo.user_exists(id).await? {
            return Err(ServiceError::not_found("User", id));
        }

        Self::validate_business_rules(&update.username)?;

        if repo.username_exists(&update.username, Some(id)).await? {
            return Err(ServiceError::already_exists("Username", &update.username));
        }
        if repo.email_exists(&update.email, Some(id)).await? {
            return Err(ServiceError::already_exists("Email", &update.email));
        }

        if !repo.update_user(id, update).await? {
            return Err(ServiceError::invalid_operation(format!(
                "Updating user {id} failed on save."
            )));
        }

        if let Some(password) = new_password {
            self.update_password(id, password).await?;
        }

        Ok(())
    }

    /// Stores a new password. Previously issued tokens stop validating.
    pub async fn update_password(&self, id: &str, new_password: &str) -> ServiceResult<()> {
        let password_hash = self.hash_password(new_password)?;

        let repo = UserRepository::new(self.pool);
        if !repo.update_password(id, &password_hash).await? {
            return Err(ServiceError::not_found("User", id));
        }

        tracing::info!("Password changed for user {}", id);
        Ok(())
    }

    pub async fn delete_user(&self, id: &str) -> ServiceResult<()> {
        let repo = UserRepository::new(self.pool);
        if !repo.delete_user(id).await? {
            return Err(ServiceError::not_found("User", id));
        }

        tracing::info!("Deleted user {}", id);
        Ok(())
    }

    /// Business validation rules.
    fn validate_business_rules(username: &str) -> ServiceResult<()> {
        // Usernames must start with a letter
        if username
            .chars()
            .next()
            .is_none_or(|c| !c.is_alphabetic())
        {
            return Err(ServiceError::invalid_operation(
                "Username must start with a letter",
            ));
        }

        if username.chars().any(char::is_whitespace) {
            return Err(ServiceError::invalid_operation(
                "Username must not contain whitespace",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        pool
    }

    fn new_user(username: &str) -> NewUser {
        NewUser {
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            username: username.into(),
            password: "secret-password".into(),
            email: format!("{username}@example.com"),
            phone_number: "81234567".into(),
            role: Role::User,
        }
    }

    #[tokio::test]
    async fn test_authenticate_hides_which_part_failed() {
        let pool = test_pool().await;
        let service = UserService::new(&pool, 4);
        service.create_user(new_user("jane")).await.unwrap();

        assert!(
            service
                .authenticate("jane", "secret-password")
                .await
                .unwrap()
                .is_some()
        );
        assert!(service.authenticate("jane", "wrong").await.unwrap().is_none());
        assert!(
            service
                .authenticate("nobody", "secret-password")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_unknown_username_still_runs_a_hash_check() {
        let pool = test_pool().await;
        let service = UserService::new(&pool, 4);

        assert!(service.authenticate("ghost", "whatever").await.unwrap().is_none());

        let dummy = DUMMY_HASH.get().expect("dummy hash initialised");
        assert!(dummy.starts_with("$2"));
        assert!(!UserService::verify_password("whatever", dummy));
    }

    #[tokio::test]
    async fn test_duplicate_username_is_a_domain_error() {
        let pool = test_pool().await;
        let service = UserService::new(&pool, 4);
        service.create_user(new_user("jane")).await.unwrap();

        let mut again = new_user("jane");
        again.email = "other@example.com".into();
        assert!(matches!(
            service.create_user(again).await,
            Err(ServiceError::AlreadyExists { .. })
        ));
    }

    #[tokio::test]
    async fn test_username_rules() {
        let pool = test_pool().await;
        let service = UserService::new(&pool, 4);

        for bad in ["1jane", "_jane", "ja ne"] {
            assert!(matches!(
                service.create_user(new_user(bad)).await,
                Err(ServiceError::InvalidOperation { .. })
            ));
        }
    }

    #[tokio::test]
    async fn test_update_password_replaces_credentials() {
        let pool = test_pool().await;
        let service = UserService::new(&pool, 4);
        let user = service.create_user(new_user("jane")).await.unwrap();

        service.update_password(&user.id, "brand-new-pass").await.unwrap();

        assert!(
            service
                .authenticate("jane", "secret-password")
                .await
                .unwrap()
                .is_none()
        );
        let user = service
            .authenticate("jane", "brand-new-pass")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.token_version, 1);
    }

    #[tokio::test]
    async fn test_update_unknown_user_is_not_found() {
        let pool = test_pool().await;
        let service = UserService::new(&pool, 4);

        let update = UpdateUser {
            first_name: "A".into(),
            last_name: "B".into(),
            username: "ab".into(),
            email: "ab@example.com".into(),
            phone_number: String::new(),
        };
        assert!(matches!(
            service.update_user("missing", update, None).await,
            Err(ServiceError::NotFound { .. })
        ));
        assert!(matches!(
            service.delete_user("missing").await,
            Err(ServiceError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_ensure_admin_is_idempotent() {
        let pool = test_pool().await;
        let service = UserService::new(&pool, 4);
        let admin = AdminBootstrap {
            username: "root".into(),
            password: "root-password".into(),
            email: "root@example.com".into(),
        };

        service.ensure_admin(&admin).await.unwrap();
        service.ensure_admin(&admin).await.unwrap();

        let user = service
            .authenticate("root", "root-password")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.role, Role::Admin);
    }
}

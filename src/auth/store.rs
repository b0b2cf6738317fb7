//! In-memory user table.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

use crate::auth::{AuthError, PasswordHasher, ADMIN_USERNAME};

// == User Record ==
/// Stored credential record. Usernames are unique keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub username: String,
    pub hashed_password: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub disabled: bool,
}

impl UserRecord {
    pub fn is_admin(&self) -> bool {
        self.username == ADMIN_USERNAME
    }

    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            username: self.username.clone(),
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            disabled: self.disabled,
        }
    }
}

/// User record without its password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    pub username: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub disabled: bool,
}

// == Auth Store ==
/// Username → record map with hashing built in.
///
/// Records are never removed; admins can only disable them.
#[derive(Debug)]
pub struct AuthStore {
    users: RwLock<HashMap<String, UserRecord>>,
    hasher: PasswordHasher,
}

impl AuthStore {
    pub fn new(hasher: PasswordHasher) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            hasher,
        }
    }

    /// Creates a store holding the demo `admin` and `user` accounts.
    pub async fn with_demo_users(hasher: PasswordHasher) -> Result<Self, AuthError> {
        let store = Self::new(hasher);
        store
            .register("admin", Some("admin@example.com"), "admin123", Some("Administrator"))
            .await?;
        store
            .register("user", Some("user@example.com"), "user123", Some("Regular User"))
            .await?;
        Ok(store)
    }

    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    /// Adds a new user. Fails without touching anything if the name is taken.
    pub async fn register(
        &self,
        username: &str,
        email: Option<&str>,
        password: &str,
        full_name: Option<&str>,
    ) -> Result<PublicUser, AuthError> {
        if self.users.read().await.contains_key(username) {
            return Err(AuthError::UserExists(username.to_string()));
        }

        let hashed_password = self.hasher.hash_async(password.to_string()).await?;

        let mut users = self.users.write().await;
        // Re-checked under the write lock: another registration may have won the race.
        if users.contains_key(username) {
            return Err(AuthError::UserExists(username.to_string()));
        }

        let record = UserRecord {
            username: username.to_string(),
            hashed_password,
            email: email.map(str::to_string),
            full_name: full_name.map(str::to_string),
            disabled: false,
        };
        let public = record.to_public();
        users.insert(username.to_string(), record);

        info!(username, "New user registered");
        Ok(public)
    }

    /// Returns the record only if the password matches its hash.
    pub async fn authenticate(&self, username: &str, password: &str) -> Option<UserRecord> {
        let user = self.get(username).await?;
        let matches = self
            .hasher
            .verify_async(password.to_string(), user.hashed_password.clone())
            .await;
        matches.then_some(user)
    }

    pub async fn get(&self, username: &str) -> Option<UserRecord> {
        self.users.read().await.get(username).cloned()
    }

    /// Replaces the password after checking the old one.
    pub async fn change_password(
        &self,
        username: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let user = self
            .authenticate(username, old_password)
            .await
            .ok_or(AuthError::InvalidCredentials)?;

        let hashed = self.hasher.hash_async(new_password.to_string()).await?;

        let mut users = self.users.write().await;
        let record = users
            .get_mut(&user.username)
            .ok_or_else(|| AuthError::UserNotFound(username.to_string()))?;
        record.hashed_password = hashed;

        info!(username, "Password changed");
        Ok(())
    }

    /// Sets the disabled flag. Returns the updated public record.
    pub async fn set_disabled(&self, username: &str, disabled: bool) -> Result<PublicUser, AuthError> {
        let mut users = self.users.write().await;
        let record = users
            .get_mut(username)
            .ok_or_else(|| AuthError::UserNotFound(username.to_string()))?;
        record.disabled = disabled;

        info!(username, disabled, "User status changed");
        Ok(record.to_public())
    }

    /// All users sorted by username.
    pub async fn list(&self) -> Vec<PublicUser> {
        let users = self.users.read().await;
        let mut list: Vec<PublicUser> = users.values().map(UserRecord::to_public).collect();
        list.sort_by(|a, b| a.username.cmp(&b.username));
        list
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

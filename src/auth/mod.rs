//! Authentication Module
//!
//! In-memory user table, Argon2 password hashing and HS256 bearer tokens.

mod password;
mod store;
mod token;


use thiserror::Error;

pub use password::PasswordHasher;
pub use store::{AuthStore, PublicUser, UserRecord};
pub use token::{Claims, TokenService};

/// Username that carries admin rights.
pub const ADMIN_USERNAME: &str = "admin";

// == Auth Error ==
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Could not validate credentials")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Username already registered: {0}")]
    UserExists(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Inactive user")]
    Inactive,

    #[error("Admin privileges required")]
    AdminRequired,

    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

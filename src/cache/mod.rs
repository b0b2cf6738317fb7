//! Cache Module
//!
//! In-memory TTL cache used to memoize idempotent read endpoints.
//! Entries expire lazily on access; a background sweep reclaims the rest.

mod entry;
mod stats;
mod store;


// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry};
pub use stats::CacheStats;
pub use store::CacheStore;

// == Well-known Keys ==
/// Cache key for the predefined topic list
pub const TOPICS_KEY: &str = "topics";

/// Cache key for the admin user listing
pub const ADMIN_USERS_KEY: &str = "admin:users";

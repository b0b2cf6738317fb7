//! API Handlers
//!
//! HTTP request handlers, grouped by area.

mod admin;
mod auth;
mod generation;
mod notify;
mod system;

pub use admin::{disable_user_handler, enable_user_handler, list_users_handler};
pub use auth::{change_password_handler, login_handler, me_handler, register_handler};
pub use generation::{generate_handler, image_handler};
pub use notify::{test_notification_handler, webhook_handler};
pub use system::{
    cache_clear_handler, cache_status_handler, fallback_handler, health_handler, metrics_handler,
    root_handler, topics_handler, PREDEFINED_TOPICS,
};

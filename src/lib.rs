//! Blog Generator - an HTTP service that writes SEO blog posts
//!
//! Text comes from a chat-completions provider and illustrations from an
//! image provider. Around generation sit token auth, per-client rate
//! limiting, a TTL cache, request metrics, health probes and chat
//! notifications.

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod generation;
pub mod models;
pub mod monitoring;
pub mod notify;
pub mod ratelimit;
pub mod tasks;
pub mod validation;

pub use api::{create_router, AppState};
pub use config::Config;
pub use tasks::spawn_cleanup_task;

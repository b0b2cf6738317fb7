//! Best-effort chat notifications.

pub mod dispatcher;
pub mod messages;
pub mod telegram;

use async_trait::async_trait;
use thiserror::Error;

pub use dispatcher::NotificationDispatcher;
pub use telegram::{TelegramConfig, TelegramNotifier, TELEGRAM_API_BASE};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    #[error("notification request failed: {0}")]
    Transport(String),

    #[error("notification rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// A chat sink for text messages and photos.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_message(&self, text: &str) -> Result<(), NotifyError>;

    async fn send_photo(&self, jpeg: Vec<u8>, caption: &str) -> Result<(), NotifyError>;
}

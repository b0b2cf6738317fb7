//! Fire-and-forget notification dispatch.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::notify::Notifier;

/// Spawns notification sends off the request path. Failures are logged only.
#[derive(Clone, Default)]
pub struct NotificationDispatcher {
    notifier: Option<Arc<dyn Notifier>>,
}

impl std::fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationDispatcher")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            notifier: Some(notifier),
        }
    }

    pub fn disabled() -> Self {
        Self { notifier: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.notifier.is_some()
    }

    pub fn notify(&self, message: impl Into<String>) {
        let Some(notifier) = self.notifier.clone() else {
            debug!("notifications disabled, message dropped");
            return;
        };
        let message = message.into();
        tokio::spawn(async move {
            if let Err(e) = notifier.send_message(&message).await {
                warn!(error = %e, "failed to send notification");
            }
        });
    }

    pub fn notify_photo(&self, jpeg: Vec<u8>, caption: impl Into<String>) {
        let Some(notifier) = self.notifier.clone() else {
            debug!("notifications disabled, photo dropped");
            return;
        };
        let caption = caption.into();
        tokio::spawn(async move {
            if let Err(e) = notifier.send_photo(jpeg, &caption).await {
                warn!(error = %e, "failed to send photo notification");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NotifyError;
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct RecordingNotifier {
        messages: Mutex<Vec<String>>,
        photos: Mutex<Vec<(usize, String)>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send_message(&self, text: &str) -> Result<(), NotifyError> {
            self.messages.lock().await.push(text.to_string());
            Ok(())
        }

        async fn send_photo(&self, jpeg: Vec<u8>, caption: &str) -> Result<(), NotifyError> {
            self.photos.lock().await.push((jpeg.len(), caption.to_string()));
            Err(NotifyError::Transport("offline".into()))
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn test_dispatch_reaches_notifier() {
        let recorder = Arc::new(RecordingNotifier::default());
        let dispatcher = NotificationDispatcher::new(recorder.clone());
        assert!(dispatcher.is_enabled());

        dispatcher.notify("hello");
        dispatcher.notify_photo(vec![1, 2, 3], "caption");
        settle().await;

        assert_eq!(*recorder.messages.lock().await, vec!["hello".to_string()]);
        assert_eq!(*recorder.photos.lock().await, vec![(3, "caption".to_string())]);
    }

    #[tokio::test]
    async fn test_disabled_dispatcher_is_noop() {
        let dispatcher = NotificationDispatcher::disabled();
        assert!(!dispatcher.is_enabled());
        dispatcher.notify("ignored");
        dispatcher.notify_photo(Vec::new(), "ignored");
    }
}

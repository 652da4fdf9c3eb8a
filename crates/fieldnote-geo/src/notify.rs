//! Local notification posting.

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::info;

use fieldnote_core::Result;

/// Channel id for proximity alerts.
pub const PROXIMITY_CHANNEL_ID: &str = "proximity";

/// Notification channel importance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Importance {
    Low,
    Normal,
    High,
}

/// A notification channel descriptor, configured once at startup.
#[derive(Debug, Clone)]
pub struct NotificationChannel {
    pub id: String,
    pub name: String,
    pub importance: Importance,
}

/// The single high-importance channel proximity alerts post to.
pub fn proximity_channel() -> NotificationChannel {
    NotificationChannel {
        id: PROXIMITY_CHANNEL_ID.to_string(),
        name: "Nearby notes".to_string(),
        importance: Importance::High,
    }
}

/// A local notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub channel_id: String,
    pub title: String,
    pub body: String,
}

/// Posting seam; the delivery transport behind it is external.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Post a notification. Failures are the caller's to surface; posting
    /// never panics.
    async fn post(&self, notification: Notification) -> Result<()>;
}

/// Notifier that logs and fans posted notifications out to in-process
/// subscribers (the delivery transport consumes the broadcast side).
pub struct LocalNotifier {
    channel: NotificationChannel,
    tx: broadcast::Sender<Notification>,
}

impl LocalNotifier {
    pub fn new(channel: NotificationChannel) -> Self {
        let (tx, _) = broadcast::channel(32);
        Self { channel, tx }
    }

    /// The channel this notifier posts on.
    pub fn channel(&self) -> &NotificationChannel {
        &self.channel
    }

    /// Subscribe to posted notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }
}

#[async_trait]
impl Notifier for LocalNotifier {
    async fn post(&self, notification: Notification) -> Result<()> {
        info!(
            subsystem = "geo",
            component = "notifier",
            op = "post",
            channel = %notification.channel_id,
            title = %notification.title,
            "Posting local notification"
        );
        let _ = self.tx.send(notification);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_post_reaches_subscribers() {
        let notifier = LocalNotifier::new(proximity_channel());
        let mut rx = notifier.subscribe();

        notifier
            .post(Notification {
                channel_id: PROXIMITY_CHANNEL_ID.into(),
                title: "Nearby note!".into(),
                body: "You are near note abc".into(),
            })
            .await
            .unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.title, "Nearby note!");
    }

    #[test]
    fn test_proximity_channel_is_high_importance() {
        let channel = proximity_channel();
        assert_eq!(channel.id, PROXIMITY_CHANNEL_ID);
        assert_eq!(channel.importance, Importance::High);
    }
}

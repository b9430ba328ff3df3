//! Mock notifier for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::notifier::{DeliveryError, Notification, NotificationStatus, Notifier};

/// A push recorded by [`MockNotifier`].
#[derive(Debug, Clone, PartialEq)]
pub struct SentNotification {
    pub connection_id: String,
    pub notification: Notification,
    /// Whether the push was reported as delivered.
    pub delivered: bool,
}

/// Mock implementation of the Notifier trait.
///
/// Records every push in call order, including failed ones. Deliveries can
/// be made to fail for specific connections or from the n-th push onward.
#[derive(Debug, Default)]
pub struct MockNotifier {
    sent: Arc<RwLock<Vec<SentNotification>>>,
    gone: Arc<RwLock<HashSet<String>>>,
    fail_from: Arc<RwLock<Option<usize>>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// All pushes, in call order.
    pub async fn sent(&self) -> Vec<SentNotification> {
        self.sent.read().await.clone()
    }

    /// Notifications pushed to one connection, in call order.
    pub async fn notifications_for(&self, connection_id: &str) -> Vec<Notification> {
        self.sent
            .read()
            .await
            .iter()
            .filter(|s| s.connection_id == connection_id)
            .map(|s| s.notification.clone())
            .collect()
    }

    /// `(status, message)` pairs pushed to one connection.
    pub async fn messages_for(&self, connection_id: &str) -> Vec<(NotificationStatus, String)> {
        self.notifications_for(connection_id)
            .await
            .into_iter()
            .map(|n| (n.status, n.message))
            .collect()
    }

    pub async fn clear(&self) {
        self.sent.write().await.clear();
    }

    /// Every later push to this connection fails with `ConnectionGone`.
    pub async fn mark_gone(&self, connection_id: &str) {
        self.gone.write().await.insert(connection_id.to_string());
    }

    /// Pushes with a zero-based index of `n` or more fail.
    pub async fn fail_from(&self, n: usize) {
        *self.fail_from.write().await = Some(n);
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn send(
        &self,
        connection_id: &str,
        notification: &Notification,
    ) -> Result<(), DeliveryError> {
        let mut sent = self.sent.write().await;
        let index = sent.len();

        let result = if self.gone.read().await.contains(connection_id) {
            Err(DeliveryError::ConnectionGone(connection_id.to_string()))
        } else if matches!(*self.fail_from.read().await, Some(n) if index >= n) {
            Err(DeliveryError::Transport {
                connection_id: connection_id.to_string(),
                reason: "simulated failure".to_string(),
            })
        } else {
            Ok(())
        };

        sent.push(SentNotification {
            connection_id: connection_id.to_string(),
            notification: notification.clone(),
            delivered: result.is_ok(),
        });
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_in_order() {
        let notifier = MockNotifier::new();
        notifier
            .send("a", &Notification::processing("one"))
            .await
            .unwrap();
        notifier
            .send("b", &Notification::processing("other"))
            .await
            .unwrap();
        notifier.send("a", &Notification::error("two")).await.unwrap();

        let messages = notifier.messages_for("a").await;
        assert_eq!(
            messages,
            vec![
                (NotificationStatus::Processing, "one".to_string()),
                (NotificationStatus::Error, "two".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let notifier = MockNotifier::new();
        notifier.mark_gone("gone").await;
        assert!(matches!(
            notifier.send("gone", &Notification::processing("x")).await,
            Err(DeliveryError::ConnectionGone(_))
        ));

        notifier.fail_from(2).await;
        assert!(notifier.send("ok", &Notification::processing("y")).await.is_ok());
        assert!(notifier.send("ok", &Notification::processing("z")).await.is_err());
        assert_eq!(notifier.sent().await.len(), 3);
    }
}

//! Notification channel: server-initiated pushes to a client connection.

mod traits;
mod types;

pub use traits::{DeliveryError, Notifier};
pub use types::{Notification, NotificationStatus};

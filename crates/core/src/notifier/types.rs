use serde::{Deserialize, Serialize};

/// Status carried by every pushed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Processing,
    Success,
    Error,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationStatus::Processing => "processing",
            NotificationStatus::Success => "success",
            NotificationStatus::Error => "error",
        }
    }

    /// `success` and `error` end a job's observable lifecycle.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, NotificationStatus::Processing)
    }
}

/// Event pushed to a client connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub status: NotificationStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl Notification {
    pub fn processing(message: impl Into<String>) -> Self {
        Self {
            status: NotificationStatus::Processing,
            message: message.into(),
            data: None,
        }
    }

    pub fn success(message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            status: NotificationStatus::Success,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: NotificationStatus::Error,
            message: message.into(),
            data: None,
        }
    }

    /// Serialized wire form.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

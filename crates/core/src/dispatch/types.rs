//! Transport events and routing.

use std::fmt;
use std::str::FromStr;

use crate::pipeline::{JobReport, ValidationError};
use crate::registry::RegistryError;

/// The routes this service handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteKey {
    /// A client connection was opened.
    Connect,
    /// A client connection was closed.
    Disconnect,
    /// A client submitted a separation job.
    Submit,
}

impl RouteKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteKey::Connect => "$connect",
            RouteKey::Disconnect => "$disconnect",
            RouteKey::Submit => "split",
        }
    }
}

impl FromStr for RouteKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "$connect" => Ok(RouteKey::Connect),
            "$disconnect" => Ok(RouteKey::Disconnect),
            // "split" is the historical name
            "split" | "submit" => Ok(RouteKey::Submit),
            other => Err(ValidationError::InvalidRoute(other.to_string())),
        }
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One event delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportEvent {
    pub connection_id: String,
    pub route_key: String,
    pub body: Option<String>,
}

impl TransportEvent {
    pub fn connect(connection_id: impl Into<String>) -> Self {
        Self {
            connection_id: connection_id.into(),
            route_key: RouteKey::Connect.as_str().to_string(),
            body: None,
        }
    }

    pub fn disconnect(connection_id: impl Into<String>) -> Self {
        Self {
            connection_id: connection_id.into(),
            route_key: RouteKey::Disconnect.as_str().to_string(),
            body: None,
        }
    }

    pub fn message(
        connection_id: impl Into<String>,
        route_key: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            connection_id: connection_id.into(),
            route_key: route_key.into(),
            body: Some(body.into()),
        }
    }
}

/// Result of a connect or disconnect.
#[derive(Debug)]
pub enum LifecycleOutcome {
    Accepted,
    Rejected(RegistryError),
}

impl LifecycleOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, LifecycleOutcome::Accepted)
    }

    pub fn status_code(&self) -> u16 {
        match self {
            LifecycleOutcome::Accepted => 200,
            LifecycleOutcome::Rejected(_) => 500,
        }
    }
}

/// What the dispatcher hands back to the transport.
#[derive(Debug)]
pub struct EventResponse {
    pub status: u16,
    /// Set for submit events that reached the pipeline.
    pub report: Option<JobReport>,
}

impl EventResponse {
    pub fn status(status: u16) -> Self {
        Self {
            status,
            report: None,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_key_parse() {
        assert_eq!("$connect".parse::<RouteKey>().unwrap(), RouteKey::Connect);
        assert_eq!(
            "$disconnect".parse::<RouteKey>().unwrap(),
            RouteKey::Disconnect
        );
        assert_eq!("split".parse::<RouteKey>().unwrap(), RouteKey::Submit);
        assert_eq!("submit".parse::<RouteKey>().unwrap(), RouteKey::Submit);
    }

    #[test]
    fn test_unknown_route_is_validation_error() {
        let err = "$default".parse::<RouteKey>().unwrap_err();
        assert!(matches!(err, ValidationError::InvalidRoute(ref r) if r == "$default"));
        assert_eq!(err.client_message(), "Invalid route key");
    }

    #[test]
    fn test_lifecycle_status() {
        assert_eq!(LifecycleOutcome::Accepted.status_code(), 200);
        assert_eq!(
            LifecycleOutcome::Rejected(RegistryError::Store("locked".into())).status_code(),
            500
        );
    }
}

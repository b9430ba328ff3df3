//! Transport event handling.
//!
//! The transport reports three kinds of events, keyed by route:
//!
//! - `$connect` / `$disconnect`: handled by [`LifecycleHandler`] against the
//!   connection registry
//! - `split` (or `submit`): a job request, handed to the job pipeline
//!
//! Anything else is answered with an `error("Invalid route key")` push and a
//! server-error status.

mod dispatcher;
mod lifecycle;
mod types;

pub use dispatcher::EventDispatcher;
pub use lifecycle::LifecycleHandler;
pub use types::{EventResponse, LifecycleOutcome, RouteKey, TransportEvent};

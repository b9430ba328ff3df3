//! Routes transport events to the lifecycle handler or the pipeline.

use std::sync::Arc;

use tracing::{debug, warn};

use super::lifecycle::LifecycleHandler;
use super::types::{EventResponse, RouteKey, TransportEvent};
use crate::notifier::{Notification, Notifier};
use crate::pipeline::JobPipeline;

/// Entry point for every transport event.
pub struct EventDispatcher {
    lifecycle: LifecycleHandler,
    pipeline: Arc<JobPipeline>,
    notifier: Arc<dyn Notifier>,
}

impl EventDispatcher {
    pub fn new(
        lifecycle: LifecycleHandler,
        pipeline: Arc<JobPipeline>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            lifecycle,
            pipeline,
            notifier,
        }
    }

    pub fn lifecycle(&self) -> &LifecycleHandler {
        &self.lifecycle
    }

    pub fn pipeline(&self) -> &JobPipeline {
        &self.pipeline
    }

    /// Handles one event to completion.
    ///
    /// Submit events run the whole job before this returns.
    pub async fn dispatch(&self, event: TransportEvent) -> EventResponse {
        let route = match event.route_key.parse::<RouteKey>() {
            Ok(route) => route,
            Err(e) => {
                warn!(connection_id = %event.connection_id, error = %e, "Unroutable event");
                let notification = Notification::error(e.client_message());
                if let Err(delivery) = self
                    .notifier
                    .send(&event.connection_id, &notification)
                    .await
                {
                    warn!(
                        connection_id = %event.connection_id,
                        error = %delivery,
                        "Failed to deliver routing error"
                    );
                }
                return EventResponse::status(e.status_code());
            }
        };

        debug!(connection_id = %event.connection_id, route = %route, "Dispatching event");

        match route {
            RouteKey::Connect => EventResponse::status(
                self.lifecycle
                    .on_connect(&event.connection_id)
                    .await
                    .status_code(),
            ),
            RouteKey::Disconnect => EventResponse::status(
                self.lifecycle
                    .on_disconnect(&event.connection_id)
                    .await
                    .status_code(),
            ),
            RouteKey::Submit => {
                let report = self
                    .pipeline
                    .run(&event.connection_id, event.body.as_deref())
                    .await;
                EventResponse {
                    status: report.status,
                    report: Some(report),
                }
            }
        }
    }
}

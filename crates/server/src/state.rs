use std::sync::Arc;

use stemsplit_core::{
    BlobStore, Config, ConnectionRegistry, EventDispatcher, JobPipeline, LifecycleHandler,
    Presigner, SanitizedConfig, Separator,
};

use crate::api::{ConnectionHub, WsNotifier};

/// Shared application state
pub struct AppState {
    config: Config,
    registry: Arc<dyn ConnectionRegistry>,
    hub: Arc<ConnectionHub>,
    dispatcher: Arc<EventDispatcher>,
    presigner: Arc<dyn Presigner>,
}

impl AppState {
    /// Wires the notifier, pipeline and dispatcher around the given backends.
    pub fn new(
        config: Config,
        registry: Arc<dyn ConnectionRegistry>,
        blob_store: Arc<dyn BlobStore>,
        separator: Arc<dyn Separator>,
        presigner: Arc<dyn Presigner>,
    ) -> Self {
        let hub = Arc::new(ConnectionHub::new());
        let notifier = Arc::new(WsNotifier::new(Arc::clone(&registry), Arc::clone(&hub)));

        let pipeline = JobPipeline::new(
            blob_store,
            separator,
            notifier.clone(),
            config.pipeline.clone(),
            config.storage.result_bucket.clone(),
        );
        let dispatcher = EventDispatcher::new(
            LifecycleHandler::new(Arc::clone(&registry)),
            Arc::new(pipeline),
            notifier,
        );

        Self {
            config,
            registry,
            hub,
            dispatcher: Arc::new(dispatcher),
            presigner,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn registry(&self) -> &dyn ConnectionRegistry {
        self.registry.as_ref()
    }

    pub fn hub(&self) -> &ConnectionHub {
        &self.hub
    }

    pub fn dispatcher(&self) -> &EventDispatcher {
        &self.dispatcher
    }

    pub fn presigner(&self) -> &dyn Presigner {
        self.presigner.as_ref()
    }

    pub fn separator_name(&self) -> &str {
        self.dispatcher.pipeline().separator_name()
    }
}

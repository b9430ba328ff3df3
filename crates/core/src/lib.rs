pub mod config;
pub mod dispatch;
pub mod metrics;
pub mod notifier;
pub mod pipeline;
pub mod presign;
pub mod registry;
pub mod separator;
pub mod storage;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use dispatch::{EventDispatcher, EventResponse, LifecycleHandler, RouteKey, TransportEvent};
pub use notifier::{DeliveryError, Notification, NotificationStatus, Notifier};
pub use pipeline::{JobError, JobPipeline, JobReport, Stage, ValidationError};
pub use presign::{PresignAction, PresignError, PresignRequest, Presigner, SigV4Presigner};
pub use registry::{create_registry, ConnectionRegistry, RegistryError};
pub use separator::{create_separator, SeparatedTracks, SeparationError, Separator};
pub use storage::{create_blob_store, BlobStore, ObjectLocation, StorageError};

// Domain Layer - Pure values describing request queues and URL groups

pub mod error;
pub mod queue;
pub mod status;
pub mod url_prefix;

// Re-exports
pub use error::DomainError;
pub use queue::{
    BindingInfo, CompletionBinding, CompletionModes, CreateFlags, Http503Verbosity,
    HttpApiVersion, RawQueueHandle, RequestQueueMode, RequestQueueProperty, UrlGroupId,
    UrlGroupProperty,
};
pub use status::OsStatus;
pub use url_prefix::UrlPrefix;

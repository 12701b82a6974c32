// hsq Core - Domain Logic & Ports
// NO infrastructure dependencies (ADR-001: Hexagonal Architecture)

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use application::{RequestQueue, RequestQueueOptions, UrlGroup};
pub use error::{ErrorKind, QueueError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Application Layer - Request queue lifecycle use cases

pub mod constants;
pub mod request_queue;
pub mod url_group;

#[cfg(test)]
mod request_queue_test;

// Re-exports
pub use request_queue::{RequestQueue, RequestQueueOptions};
pub use url_group::UrlGroup;

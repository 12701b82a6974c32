// Port Layer - Interfaces for external dependencies

pub mod http_driver;

// Re-exports
pub use http_driver::mocks::{DriverCall, DriverOp, InMemoryHttpDriver, RouteOutcome};
pub use http_driver::HttpDriver;

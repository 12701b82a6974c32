// hsq Infrastructure - System Adapters
// Implements: HttpDriver (ADR-002)

use hsq_core::port::HttpDriver;
use hsq_core::Result;
use std::sync::Arc;

#[cfg(windows)]
pub mod http_sys_driver;

#[cfg(windows)]
pub use http_sys_driver::HttpSysDriver;

/// Open the kernel HTTP stack of this host
///
/// # Errors
/// - QueueError::OsOperationFailed if HTTP.sys refuses to initialize
/// - QueueError::Unsupported on hosts without HTTP.sys
#[cfg(windows)]
pub fn http_sys_driver() -> Result<Arc<dyn HttpDriver>> {
    let driver = HttpSysDriver::new()?;
    Ok(Arc::new(driver))
}

/// Open the kernel HTTP stack of this host
///
/// # Errors
/// - QueueError::Unsupported on hosts without HTTP.sys
#[cfg(not(windows))]
pub fn http_sys_driver() -> Result<Arc<dyn HttpDriver>> {
    Err(hsq_core::QueueError::Unsupported(format!(
        "HTTP.sys is not available on {}",
        std::env::consts::OS
    )))
}

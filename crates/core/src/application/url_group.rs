// URL Group - owner of a set of registered URL prefixes
// Request queues refer to a group by id only; this type owns its lifetime.

use super::constants::URL_GROUP_OBJECT;
use crate::domain::{UrlGroupId, UrlGroupProperty, UrlPrefix};
use crate::error::{QueueError, Result};
use crate::port::HttpDriver;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, warn};

/// A URL group created in the driver's server session
pub struct UrlGroup {
    driver: Arc<dyn HttpDriver>,
    id: UrlGroupId,
    prefixes: Mutex<Vec<UrlPrefix>>,
    disposed: AtomicBool,
}

impl UrlGroup {
    /// Create a new, empty URL group
    ///
    /// # Errors
    /// - QueueError::OsOperationFailed if the driver refuses
    pub fn create(driver: Arc<dyn HttpDriver>) -> Result<Self> {
        let id = driver.create_url_group().map_err(|status| {
            error!(status = %status, "Failed to create URL group");
            QueueError::OsOperationFailed(status)
        })?;

        debug!(url_group = %id, "URL group created");

        Ok(Self {
            driver,
            id,
            prefixes: Mutex::new(Vec::new()),
            disposed: AtomicBool::new(false),
        })
    }

    pub fn id(&self) -> UrlGroupId {
        self.id
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Prefixes registered through this instance
    pub fn prefixes(&self) -> Vec<UrlPrefix> {
        self.registered().clone()
    }

    /// Register a prefix; requests for it route to whichever queue is bound
    pub fn register_prefix(&self, prefix: UrlPrefix) -> Result<()> {
        self.check_disposed()?;

        self.driver.add_url(self.id, &prefix).map_err(|status| {
            error!(url_group = %self.id, prefix = %prefix, status = %status, "Failed to register URL prefix");
            QueueError::OsOperationFailed(status)
        })?;

        info!(url_group = %self.id, prefix = %prefix, "Registered URL prefix");
        self.registered().push(prefix);
        Ok(())
    }

    /// Remove a previously registered prefix
    pub fn unregister_prefix(&self, prefix: &UrlPrefix) -> Result<()> {
        self.check_disposed()?;

        self.driver.remove_url(self.id, prefix).map_err(|status| {
            warn!(url_group = %self.id, prefix = %prefix, status = %status, "Failed to unregister URL prefix");
            QueueError::OsOperationFailed(status)
        })?;

        self.registered().retain(|existing| existing != prefix);
        Ok(())
    }

    /// Set a group property
    ///
    /// Failures are always logged; `throw_on_error` decides whether they
    /// propagate.
    pub fn set_property(&self, property: UrlGroupProperty, throw_on_error: bool) -> Result<()> {
        self.check_disposed()?;
        set_url_group_property(self.driver.as_ref(), self.id, property, throw_on_error)
    }

    /// Close the group; idempotent, never fails
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }

        // Registrations die with the group
        if let Err(status) = self.driver.close_url_group(self.id) {
            warn!(url_group = %self.id, status = %status, "Failed to close URL group");
        }
        self.registered().clear();
        debug!(url_group = %self.id, "URL group closed");
    }

    fn registered(&self) -> MutexGuard<'_, Vec<UrlPrefix>> {
        self.prefixes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_disposed(&self) -> Result<()> {
        if self.is_disposed() {
            return Err(QueueError::Disposed(URL_GROUP_OBJECT));
        }
        Ok(())
    }
}

impl Drop for UrlGroup {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Set a property on a group known only by id
pub(crate) fn set_url_group_property(
    driver: &dyn HttpDriver,
    group: UrlGroupId,
    property: UrlGroupProperty,
    throw_on_error: bool,
) -> Result<()> {
    match driver.set_url_group_property(group, property) {
        Ok(()) => Ok(()),
        Err(status) => {
            error!(url_group = %group, property = ?property, status = %status, "Failed to set URL group property");
            if throw_on_error {
                Err(QueueError::OsOperationFailed(status))
            } else {
                Ok(())
            }
        }
    }
}

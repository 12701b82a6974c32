// Request Queue - lifecycle of a kernel HTTP request queue
//
// Owns exactly one OS handle plus its completion binding. Creation resolves the
// create/attach race, binding and tuning require creator rights, and disposal
// releases the binding before the handle, once.

use super::constants::{
    ATTACHED_TO_QUEUE_EVENT, DEFAULT_SKIP_COMPLETION_ON_SUCCESS, REQUEST_QUEUE_OBJECT,
};
use super::url_group::set_url_group_property;
use crate::domain::{
    BindingInfo, CompletionBinding, CompletionModes, CreateFlags, Http503Verbosity,
    HttpApiVersion, OsStatus, RawQueueHandle, RequestQueueMode, RequestQueueProperty, UrlGroupId,
    UrlGroupProperty, UrlPrefix,
};
use crate::error::{QueueError, Result};
use crate::port::HttpDriver;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, error, info, warn};

/// Per-instance construction options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestQueueOptions {
    /// Suppress completion notifications when I/O completes synchronously
    pub skip_completion_on_success: bool,
}

impl Default for RequestQueueOptions {
    fn default() -> Self {
        Self {
            skip_completion_on_success: DEFAULT_SKIP_COMPLETION_ON_SUCCESS,
        }
    }
}

/// OS handle and its completion binding, released together on drop
///
/// The binding is always released before the handle is closed.
struct QueueResources {
    driver: Arc<dyn HttpDriver>,
    handle: RawQueueHandle,
    binding: Option<CompletionBinding>,
}

impl QueueResources {
    fn new(driver: Arc<dyn HttpDriver>, handle: RawQueueHandle) -> Self {
        Self {
            driver,
            handle,
            binding: None,
        }
    }
}

impl Drop for QueueResources {
    fn drop(&mut self) {
        if let Some(binding) = self.binding.take() {
            self.driver.release_completion(binding);
        }
        if let Err(status) = self.driver.close_request_queue(self.handle) {
            warn!(handle = ?self.handle, status = %status, "Failed to close request queue handle");
        }
    }
}

/// Translate a failed create/open status into the error taxonomy
fn creation_error(status: OsStatus, flags: CreateFlags, name: Option<&str>) -> QueueError {
    let name = name.unwrap_or_default().to_string();
    if flags.contains(CreateFlags::OPEN_EXISTING) && status == OsStatus::FILE_NOT_FOUND {
        QueueError::QueueNotFound { name, status }
    } else if status == OsStatus::INVALID_NAME {
        QueueError::InvalidName { name, status }
    } else {
        QueueError::OsOperationFailed(status)
    }
}

/// Create or open the queue, tune it and bind it for async completion
///
/// Returns whether this call created the kernel object.
fn open(
    driver: &Arc<dyn HttpDriver>,
    name: Option<&str>,
    mode: RequestQueueMode,
    receiver: bool,
    options: &RequestQueueOptions,
) -> Result<(bool, QueueResources)> {
    let mut flags = CreateFlags::NONE;
    let mut created = true;

    if mode == RequestQueueMode::Attach {
        flags = CreateFlags::OPEN_EXISTING;
        created = false;
        if receiver {
            flags |= CreateFlags::DELEGATION;
        }
    }

    let mut result = driver.create_request_queue(HttpApiVersion::V2, name, flags);

    if mode == RequestQueueMode::CreateOrAttach && result == Err(OsStatus::ALREADY_EXISTS) {
        // Lost the race to create it, attach instead
        debug!(request_queue_name = ?name, "Request queue already exists, attaching");
        created = false;
        flags = CreateFlags::OPEN_EXISTING;
        result = driver.create_request_queue(HttpApiVersion::V2, name, flags);
    }

    let handle = result.map_err(|status| {
        let err = creation_error(status, flags, name);
        error!(request_queue_name = ?name, mode = %mode, error = %err, "Failed to open request queue");
        err
    })?;

    // From here on, dropping `resources` closes the handle
    let mut resources = QueueResources::new(Arc::clone(driver), handle);

    if options.skip_completion_on_success {
        driver
            .set_completion_notification_modes(
                handle,
                CompletionModes::SKIP_COMPLETION_PORT_ON_SUCCESS
                    | CompletionModes::SKIP_SET_EVENT_ON_HANDLE,
            )
            .map_err(|status| {
                error!(request_queue_name = ?name, status = %status, "Failed to set completion notification modes");
                QueueError::OsOperationFailed(status)
            })?;
    }

    let binding = driver.bind_completion(handle).map_err(|status| {
        error!(request_queue_name = ?name, status = %status, "Failed to bind request queue for async completion");
        QueueError::OsOperationFailed(status)
    })?;
    resources.binding = Some(binding);

    Ok((created, resources))
}

/// Where a queue's URL group id comes from
enum GroupSource<'a> {
    /// Supplied by the group's owner
    Known(UrlGroupId),
    /// Looked up from a delegated prefix after attaching
    Receiver(&'a UrlPrefix),
}

/// A kernel HTTP request queue
///
/// Several instances may refer to the same named queue, each through its own
/// handle. Disposing one never affects the others.
pub struct RequestQueue {
    driver: Arc<dyn HttpDriver>,
    name: Option<String>,
    mode: RequestQueueMode,
    created: bool,
    url_group: UrlGroupId,
    resources: RwLock<Option<QueueResources>>,
}

impl RequestQueue {
    /// Create or attach to a request queue serving `url_group`
    ///
    /// # Arguments
    /// * `driver` - Kernel HTTP stack
    /// * `url_group` - Group this queue is, or will be, bound to
    /// * `name` - Queue name; `None` or empty creates an anonymous queue
    /// * `mode` - Create, attach, or create-or-attach
    /// * `options` - Per-instance tuning
    ///
    /// # Errors
    /// - QueueError::QueueNotFound if attaching to a name that does not exist
    /// - QueueError::InvalidName if the OS rejects the name
    /// - QueueError::OsOperationFailed for any other OS failure
    ///
    /// Nothing is left open when an error is returned.
    ///
    /// # Example
    /// ```text
    /// let queue = RequestQueue::new(driver, group.id(), Some("orders"),
    ///     RequestQueueMode::CreateOrAttach, &RequestQueueOptions::default())?;
    /// if queue.created() {
    ///     queue.attach_to_url_group()?;
    /// }
    /// ```
    pub fn new(
        driver: Arc<dyn HttpDriver>,
        url_group: UrlGroupId,
        name: Option<&str>,
        mode: RequestQueueMode,
        options: &RequestQueueOptions,
    ) -> Result<Self> {
        Self::construct(driver, GroupSource::Known(url_group), name, mode, options)
    }

    /// Attach to an existing queue as a delegation receiver
    ///
    /// The URL group is the one that routes `url_prefix` to the named queue.
    /// If it cannot be found the freshly attached handle is released before
    /// the error propagates.
    pub fn open_receiver(
        driver: Arc<dyn HttpDriver>,
        name: &str,
        url_prefix: &str,
        options: &RequestQueueOptions,
    ) -> Result<Self> {
        let prefix = UrlPrefix::parse(url_prefix)?;
        Self::construct(
            driver,
            GroupSource::Receiver(&prefix),
            Some(name),
            RequestQueueMode::Attach,
            options,
        )
    }

    fn construct(
        driver: Arc<dyn HttpDriver>,
        group: GroupSource<'_>,
        name: Option<&str>,
        mode: RequestQueueMode,
        options: &RequestQueueOptions,
    ) -> Result<Self> {
        let name = name.filter(|name| !name.is_empty());
        let receiver = matches!(group, GroupSource::Receiver(_));
        let (created, resources) = open(&driver, name, mode, receiver, options)?;

        if !created {
            info!(
                event_name = ATTACHED_TO_QUEUE_EVENT,
                request_queue_name = ?name,
                "Attached to an existing request queue, some options do not apply"
            );
        }

        let url_group = match group {
            GroupSource::Known(id) => id,
            GroupSource::Receiver(prefix) => driver
                .find_url_group_id(prefix, resources.handle)
                .map_err(|status| {
                    error!(request_queue_name = ?name, prefix = %prefix, status = %status, "Failed to find URL group for prefix");
                    QueueError::OsOperationFailed(status)
                })?,
        };

        debug!(
            request_queue_name = ?name,
            mode = %mode,
            created = created,
            url_group = %url_group,
            "Request queue ready"
        );

        Ok(Self {
            driver,
            name: name.map(str::to_string),
            mode,
            created,
            url_group,
            resources: RwLock::new(Some(resources)),
        })
    }

    /// True if this instance created the queue instead of attaching to an existing one
    pub fn created(&self) -> bool {
        self.created
    }

    pub fn mode(&self) -> RequestQueueMode {
        self.mode
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn url_group(&self) -> UrlGroupId {
        self.url_group
    }

    pub fn is_disposed(&self) -> bool {
        self.resources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// OS handle for downstream I/O
    pub fn handle(&self) -> Result<RawQueueHandle> {
        self.resources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|resources| resources.handle)
            .ok_or(QueueError::Disposed(REQUEST_QUEUE_OBJECT))
    }

    /// Completion binding for downstream async I/O
    pub fn completion_binding(&self) -> Result<CompletionBinding> {
        self.resources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(|resources| resources.binding)
            .ok_or(QueueError::Disposed(REQUEST_QUEUE_OBJECT))
    }

    /// Route requests for the group's registered prefixes to this queue
    ///
    /// # Panics
    /// If this instance attached to an existing queue instead of creating it.
    pub fn attach_to_url_group(&self) -> Result<()> {
        self.with_creator_handle("attach_to_url_group", |handle| {
            set_url_group_property(
                self.driver.as_ref(),
                self.url_group,
                UrlGroupProperty::Binding(BindingInfo::bound(handle)),
                true,
            )?;
            info!(request_queue_name = ?self.name, url_group = %self.url_group, "Attached request queue to URL group");
            Ok(())
        })
    }

    /// Stop routing the group's prefixes here; requests then get 503s
    ///
    /// May be called more than once (stop, then abort). OS failures are
    /// logged and swallowed since this runs on shutdown paths.
    ///
    /// # Panics
    /// If this instance attached to an existing queue instead of creating it.
    pub fn detach_from_url_group(&self) -> Result<()> {
        self.with_creator_handle("detach_from_url_group", |_| {
            set_url_group_property(
                self.driver.as_ref(),
                self.url_group,
                UrlGroupProperty::Binding(BindingInfo::cleared()),
                false,
            )?;
            debug!(request_queue_name = ?self.name, url_group = %self.url_group, "Detached request queue from URL group");
            Ok(())
        })
    }

    /// Maximum number of unaccepted requests the kernel holds for this queue
    ///
    /// The listener must be active for this to work.
    pub fn set_length_limit(&self, max_length: u32) -> Result<()> {
        self.set_property("set_length_limit", RequestQueueProperty::MaxLength(max_length))
    }

    /// Detail level of the automatic 503 responses once the backlog is full
    ///
    /// The listener must be active for this to work.
    pub fn set_rejection_verbosity(&self, level: Http503Verbosity) -> Result<()> {
        self.set_property(
            "set_rejection_verbosity",
            RequestQueueProperty::RejectionVerbosity(level),
        )
    }

    /// Release the completion binding, then the handle
    ///
    /// Idempotent and safe to call concurrently; never fails.
    pub fn dispose(&self) {
        let resources = self
            .resources
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(resources) = resources {
            drop(resources);
            debug!(request_queue_name = ?self.name, "Request queue disposed");
        }
    }

    fn set_property(&self, op: &'static str, property: RequestQueueProperty) -> Result<()> {
        self.with_creator_handle(op, |handle| {
            self.driver
                .set_request_queue_property(handle, property)
                .map_err(|status| {
                    error!(request_queue_name = ?self.name, property = ?property, status = %status, "Failed to set request queue property");
                    QueueError::OsOperationFailed(status)
                })
        })
    }

    /// Run `f` with the live handle, holding off disposal meanwhile
    fn with_creator_handle<T>(
        &self,
        op: &'static str,
        f: impl FnOnce(RawQueueHandle) -> Result<T>,
    ) -> Result<T> {
        let guard = self.resources.read().unwrap_or_else(PoisonError::into_inner);
        let resources = guard
            .as_ref()
            .ok_or(QueueError::Disposed(REQUEST_QUEUE_OBJECT))?;
        assert!(
            self.created,
            "{} requires a request queue created by this instance",
            op
        );
        f(resources.handle)
    }
}

impl Drop for RequestQueue {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for RequestQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestQueue")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("created", &self.created)
            .field("url_group", &self.url_group)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

// HTTP Server API Port
// Abstraction over the kernel HTTP stack (HTTP.sys) calls the lifecycle needs

use crate::domain::{
    CompletionBinding, CompletionModes, CreateFlags, HttpApiVersion, OsStatus, RawQueueHandle,
    RequestQueueProperty, UrlGroupId, UrlGroupProperty, UrlPrefix,
};

pub mod mocks;

/// Kernel HTTP stack driver
///
/// Implementations:
/// - HttpSysDriver: Win32 HTTP Server API v2 (infra-system)
/// - InMemoryHttpDriver: in-process emulation for tests and dry runs
///
/// Every call is short and blocking. Failures are reported as the raw
/// [`OsStatus`]; translating them into [`QueueError`](crate::QueueError) is the
/// caller's job.
pub trait HttpDriver: Send + Sync {
    /// Create a request queue, or open an existing one with `OPEN_EXISTING`
    ///
    /// # Arguments
    /// * `version` - HTTP Server API version
    /// * `name` - Queue name; `None` creates an anonymous queue
    /// * `flags` - `HTTP_CREATE_REQUEST_QUEUE_FLAG_*`
    ///
    /// No security descriptor is ever passed.
    fn create_request_queue(
        &self,
        version: HttpApiVersion,
        name: Option<&str>,
        flags: CreateFlags,
    ) -> Result<RawQueueHandle, OsStatus>;

    /// Close a request queue handle
    ///
    /// The kernel object outlives the handle while other handles are open.
    fn close_request_queue(&self, handle: RawQueueHandle) -> Result<(), OsStatus>;

    /// Set a queue-level property
    fn set_request_queue_property(
        &self,
        handle: RawQueueHandle,
        property: RequestQueueProperty,
    ) -> Result<(), OsStatus>;

    /// Tune completion notifications for synchronously completed I/O
    ///
    /// Platforms without the concept treat this as a no-op.
    fn set_completion_notification_modes(
        &self,
        handle: RawQueueHandle,
        modes: CompletionModes,
    ) -> Result<(), OsStatus>;

    /// Route async I/O completions for `handle` to the process dispatcher
    fn bind_completion(&self, handle: RawQueueHandle) -> Result<CompletionBinding, OsStatus>;

    /// Release a completion binding; must precede closing its handle
    fn release_completion(&self, binding: CompletionBinding);

    /// Create a URL group in the driver's server session
    fn create_url_group(&self) -> Result<UrlGroupId, OsStatus>;

    /// Close a URL group, dropping its registrations
    fn close_url_group(&self, group: UrlGroupId) -> Result<(), OsStatus>;

    /// Register a prefix on a URL group
    fn add_url(&self, group: UrlGroupId, prefix: &UrlPrefix) -> Result<(), OsStatus>;

    /// Remove a prefix from a URL group
    fn remove_url(&self, group: UrlGroupId, prefix: &UrlPrefix) -> Result<(), OsStatus>;

    /// Set a URL group property (binding to a request queue)
    fn set_url_group_property(
        &self,
        group: UrlGroupId,
        property: UrlGroupProperty,
    ) -> Result<(), OsStatus>;

    /// Find the URL group owning `prefix` that delivers to `handle`'s queue
    fn find_url_group_id(
        &self,
        prefix: &UrlPrefix,
        handle: RawQueueHandle,
    ) -> Result<UrlGroupId, OsStatus>;
}

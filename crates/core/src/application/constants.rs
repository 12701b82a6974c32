// Lifecycle constants (ADR: No magic values)

/// Skip completion-port notifications for I/O that completes synchronously
/// unless the caller opts out
pub const DEFAULT_SKIP_COMPLETION_ON_SUCCESS: bool = true;

/// Event name emitted when a queue attaches to one created elsewhere
pub const ATTACHED_TO_QUEUE_EVENT: &str = "AttachedToQueue";

/// Object names used in disposed-state errors
pub const REQUEST_QUEUE_OBJECT: &str = "RequestQueue";
pub const URL_GROUP_OBJECT: &str = "UrlGroup";

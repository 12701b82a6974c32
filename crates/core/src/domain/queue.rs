// Request Queue Domain Model

use super::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::str::FromStr;

/// HTTP Server API version passed on every queue creation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpApiVersion {
    pub major: u16,
    pub minor: u16,
}

impl HttpApiVersion {
    pub const V2: HttpApiVersion = HttpApiVersion { major: 2, minor: 0 };
}

/// How a [`RequestQueue`](crate::application::RequestQueue) comes into existence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestQueueMode {
    /// Create a new queue; fails if the name is taken
    #[default]
    Create,
    /// Open an existing queue; fails if it does not exist
    Attach,
    /// Create the queue, attaching instead if someone else got there first
    CreateOrAttach,
}

impl fmt::Display for RequestQueueMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestQueueMode::Create => write!(f, "create"),
            RequestQueueMode::Attach => write!(f, "attach"),
            RequestQueueMode::CreateOrAttach => write!(f, "create_or_attach"),
        }
    }
}

impl FromStr for RequestQueueMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "create" => Ok(RequestQueueMode::Create),
            "attach" => Ok(RequestQueueMode::Attach),
            "create_or_attach" => Ok(RequestQueueMode::CreateOrAttach),
            _ => Err(DomainError::UnknownMode(s.to_string())),
        }
    }
}

/// Detail level of the automatic 503 responses sent once the backlog is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Http503Verbosity {
    /// Connection reset, no response body
    #[default]
    Basic,
    /// 503 with a generic reason
    Limited,
    /// 503 with the detailed reason
    Full,
}

impl Http503Verbosity {
    /// Wire value of `HTTP_503_RESPONSE_VERBOSITY`
    pub fn as_raw(self) -> i32 {
        match self {
            Http503Verbosity::Basic => 0,
            Http503Verbosity::Limited => 1,
            Http503Verbosity::Full => 2,
        }
    }
}

impl FromStr for Http503Verbosity {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "basic" => Ok(Http503Verbosity::Basic),
            "limited" => Ok(Http503Verbosity::Limited),
            "full" => Ok(Http503Verbosity::Full),
            _ => Err(DomainError::UnknownVerbosity(s.to_string())),
        }
    }
}

/// `HTTP_CREATE_REQUEST_QUEUE_FLAG_*` bit set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CreateFlags(u32);

impl CreateFlags {
    pub const NONE: CreateFlags = CreateFlags(0);
    pub const OPEN_EXISTING: CreateFlags = CreateFlags(0x1);
    pub const CONTROLLER: CreateFlags = CreateFlags(0x2);
    pub const DELEGATION: CreateFlags = CreateFlags(0x8);

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: CreateFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for CreateFlags {
    type Output = CreateFlags;

    fn bitor(self, rhs: CreateFlags) -> CreateFlags {
        CreateFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for CreateFlags {
    fn bitor_assign(&mut self, rhs: CreateFlags) {
        self.0 |= rhs.0;
    }
}

/// `FILE_SKIP_*` completion notification modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompletionModes(u8);

impl CompletionModes {
    pub const SKIP_COMPLETION_PORT_ON_SUCCESS: CompletionModes = CompletionModes(0x1);
    pub const SKIP_SET_EVENT_ON_HANDLE: CompletionModes = CompletionModes(0x2);

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, other: CompletionModes) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for CompletionModes {
    type Output = CompletionModes;

    fn bitor(self, rhs: CompletionModes) -> CompletionModes {
        CompletionModes(self.0 | rhs.0)
    }
}

/// Opaque OS handle of an open request queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawQueueHandle(pub usize);

/// Opaque token for a handle's async completion registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompletionBinding(pub usize);

/// `HTTP_URL_GROUP_ID`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UrlGroupId(pub u64);

impl fmt::Display for UrlGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}", self.0)
    }
}

/// Tunable request queue properties
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestQueueProperty {
    /// `HttpServerQueueLengthProperty`
    MaxLength(u32),
    /// `HttpServer503VerbosityProperty`
    RejectionVerbosity(Http503Verbosity),
}

/// `HTTP_BINDING_INFO`: which request queue serves a URL group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingInfo {
    queue: Option<RawQueueHandle>,
}

impl BindingInfo {
    /// Flag present, requests route to `handle`
    pub fn bound(handle: RawQueueHandle) -> Self {
        Self {
            queue: Some(handle),
        }
    }

    /// No flags, null handle; requests get 503s
    pub fn cleared() -> Self {
        Self { queue: None }
    }

    pub fn is_present(&self) -> bool {
        self.queue.is_some()
    }

    pub fn queue(&self) -> Option<RawQueueHandle> {
        self.queue
    }
}

/// URL group properties this workspace sets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlGroupProperty {
    /// `HttpServerBindingProperty`
    Binding(BindingInfo),
}

// Win32 status codes returned by the HTTP Server API

use std::fmt;

/// Raw status code reported by the OS HTTP stack
///
/// Only the codes the lifecycle logic branches on get names; everything else
/// is carried through opaquely for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OsStatus(pub u32);

impl OsStatus {
    pub const SUCCESS: OsStatus = OsStatus(0);
    pub const FILE_NOT_FOUND: OsStatus = OsStatus(2);
    pub const ACCESS_DENIED: OsStatus = OsStatus(5);
    pub const INVALID_HANDLE: OsStatus = OsStatus(6);
    pub const NOT_SUPPORTED: OsStatus = OsStatus(50);
    pub const INVALID_PARAMETER: OsStatus = OsStatus(87);
    pub const INVALID_NAME: OsStatus = OsStatus(123);
    pub const ALREADY_EXISTS: OsStatus = OsStatus(183);

    pub fn code(self) -> u32 {
        self.0
    }

    pub fn is_success(self) -> bool {
        self == Self::SUCCESS
    }

    /// Symbolic name for well-known codes
    pub fn name(self) -> Option<&'static str> {
        match self {
            Self::SUCCESS => Some("ERROR_SUCCESS"),
            Self::FILE_NOT_FOUND => Some("ERROR_FILE_NOT_FOUND"),
            Self::ACCESS_DENIED => Some("ERROR_ACCESS_DENIED"),
            Self::INVALID_HANDLE => Some("ERROR_INVALID_HANDLE"),
            Self::NOT_SUPPORTED => Some("ERROR_NOT_SUPPORTED"),
            Self::INVALID_PARAMETER => Some("ERROR_INVALID_PARAMETER"),
            Self::INVALID_NAME => Some("ERROR_INVALID_NAME"),
            Self::ALREADY_EXISTS => Some("ERROR_ALREADY_EXISTS"),
            _ => None,
        }
    }

    /// Convert a raw return value into a Result
    pub fn check(code: u32) -> Result<(), OsStatus> {
        match OsStatus(code) {
            status if status.is_success() => Ok(()),
            status => Err(status),
        }
    }
}

impl fmt::Display for OsStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} ({})", self.0, name),
            None => write!(f, "{} (0x{:08X})", self.0, self.0),
        }
    }
}

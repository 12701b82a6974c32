// HttpDriver over the Win32 HTTP Server API v2
// reason: windows-sys raw bindings; every call is a thin, blocking FFI shim
use std::ffi::c_void;
use std::mem::size_of;
use std::ptr;
use tracing::{debug, trace, warn};

use hsq_core::domain::{
    CompletionBinding, CompletionModes, CreateFlags, HttpApiVersion, OsStatus, RawQueueHandle,
    RequestQueueProperty, UrlGroupId, UrlGroupProperty, UrlPrefix,
};
use hsq_core::port::HttpDriver;
use hsq_core::{QueueError, Result};

use windows_sys::Win32::Foundation::{GetLastError, HANDLE};
use windows_sys::Win32::Networking::HttpServer::{
    HttpAddUrlToUrlGroup, HttpCloseRequestQueue, HttpCloseServerSession, HttpCloseUrlGroup,
    HttpCreateRequestQueue, HttpCreateServerSession, HttpCreateUrlGroup, HttpFindUrlGroupId,
    HttpInitialize, HttpRemoveUrlFromUrlGroup, HttpServer503VerbosityProperty,
    HttpServerBindingProperty, HttpServerQueueLengthProperty, HttpSetRequestQueueProperty,
    HttpSetUrlGroupProperty, HttpTerminate, HTTPAPI_VERSION, HTTP_503_RESPONSE_VERBOSITY,
    HTTP_BINDING_INFO, HTTP_INITIALIZE_SERVER, HTTP_PROPERTY_FLAGS,
};
use windows_sys::Win32::Storage::FileSystem::SetFileCompletionNotificationModes;
use windows_sys::Win32::System::Threading::{
    CloseThreadpoolIo, CreateThreadpoolIo, PTP_CALLBACK_INSTANCE, PTP_IO,
};

/// `HTTP_PROPERTY_FLAG_PRESENT`
const PROPERTY_FLAG_PRESENT: u32 = 0x1;

fn api_version(version: HttpApiVersion) -> HTTPAPI_VERSION {
    HTTPAPI_VERSION {
        HttpApiMajorVersion: version.major,
        HttpApiMinorVersion: version.minor,
    }
}

/// NUL-terminated UTF-16 copy of `s`
fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

fn raw_handle(handle: RawQueueHandle) -> HANDLE {
    handle.0 as HANDLE
}

/// Completions are consumed by whoever issues I/O on the queue; this only traces them
unsafe extern "system" fn on_io_completion(
    _instance: PTP_CALLBACK_INSTANCE,
    _context: *mut c_void,
    overlapped: *mut c_void,
    io_result: u32,
    bytes_transferred: usize,
    _io: PTP_IO,
) {
    trace!(
        overlapped = ?overlapped,
        status = %OsStatus(io_result),
        bytes = bytes_transferred,
        "Request queue I/O completed"
    );
}

/// HTTP.sys driver owning one server session
///
/// HTTP.sys is initialized for server use on construction and terminated on
/// drop. URL groups are created inside the session.
pub struct HttpSysDriver {
    session_id: u64,
}

impl HttpSysDriver {
    /// Initialize HTTP.sys and open a server session
    ///
    /// # Errors
    /// - QueueError::OsOperationFailed if either call fails
    pub fn new() -> Result<Self> {
        let version = api_version(HttpApiVersion::V2);

        // SAFETY: reserved pointer must be null
        let status = unsafe { HttpInitialize(version, HTTP_INITIALIZE_SERVER, ptr::null_mut()) };
        OsStatus::check(status).map_err(QueueError::OsOperationFailed)?;

        let mut session_id = 0u64;
        // SAFETY: session_id outlives the call
        let status = unsafe { HttpCreateServerSession(version, &mut session_id, 0) };
        if let Err(status) = OsStatus::check(status) {
            // SAFETY: balances the successful HttpInitialize above
            unsafe { HttpTerminate(HTTP_INITIALIZE_SERVER, ptr::null_mut()) };
            return Err(QueueError::OsOperationFailed(status));
        }

        debug!(session_id = session_id, "HTTP.sys server session opened");
        Ok(Self { session_id })
    }
}

impl Drop for HttpSysDriver {
    fn drop(&mut self) {
        // SAFETY: session was opened in new() and is closed once
        let status = unsafe { HttpCloseServerSession(self.session_id) };
        if let Err(status) = OsStatus::check(status) {
            warn!(session_id = self.session_id, status = %status, "Failed to close server session");
        }
        // SAFETY: balances HttpInitialize in new()
        unsafe { HttpTerminate(HTTP_INITIALIZE_SERVER, ptr::null_mut()) };
    }
}

impl HttpDriver for HttpSysDriver {
    fn create_request_queue(
        &self,
        version: HttpApiVersion,
        name: Option<&str>,
        flags: CreateFlags,
    ) -> std::result::Result<RawQueueHandle, OsStatus> {
        let wide = name.map(to_wide);
        let name_ptr = wide.as_ref().map_or(ptr::null(), |w| w.as_ptr());
        let mut handle: HANDLE = 0;

        // SAFETY: name_ptr is null or a live NUL-terminated buffer; no security attributes
        let status = unsafe {
            HttpCreateRequestQueue(
                api_version(version),
                name_ptr,
                ptr::null(),
                flags.bits(),
                &mut handle,
            )
        };
        OsStatus::check(status)?;
        Ok(RawQueueHandle(handle as usize))
    }

    fn close_request_queue(&self, handle: RawQueueHandle) -> std::result::Result<(), OsStatus> {
        // SAFETY: handle came from HttpCreateRequestQueue and is closed once by its owner
        OsStatus::check(unsafe { HttpCloseRequestQueue(raw_handle(handle)) })
    }

    fn set_request_queue_property(
        &self,
        handle: RawQueueHandle,
        property: RequestQueueProperty,
    ) -> std::result::Result<(), OsStatus> {
        let (id, value): (_, u32) = match property {
            RequestQueueProperty::MaxLength(length) => (HttpServerQueueLengthProperty, length),
            RequestQueueProperty::RejectionVerbosity(level) => {
                let raw: HTTP_503_RESPONSE_VERBOSITY = level.as_raw();
                (HttpServer503VerbosityProperty, raw as u32)
            }
        };

        // SAFETY: value is a 4-byte property buffer living across the call
        let status = unsafe {
            HttpSetRequestQueueProperty(
                raw_handle(handle),
                id,
                &value as *const u32 as *const c_void,
                size_of::<u32>() as u32,
                0,
                ptr::null(),
            )
        };
        OsStatus::check(status)
    }

    fn set_completion_notification_modes(
        &self,
        handle: RawQueueHandle,
        modes: CompletionModes,
    ) -> std::result::Result<(), OsStatus> {
        // SAFETY: plain handle flag update
        let ok = unsafe { SetFileCompletionNotificationModes(raw_handle(handle), modes.bits()) };
        if ok == 0 {
            // SAFETY: reads thread-local error state
            return Err(OsStatus(unsafe { GetLastError() }));
        }
        Ok(())
    }

    fn bind_completion(&self, handle: RawQueueHandle) -> std::result::Result<CompletionBinding, OsStatus> {
        // SAFETY: callback is a static fn; default callback environment
        let io = unsafe {
            CreateThreadpoolIo(
                raw_handle(handle),
                Some(on_io_completion),
                ptr::null_mut(),
                ptr::null(),
            )
        };
        if io == 0 {
            // SAFETY: reads thread-local error state
            return Err(OsStatus(unsafe { GetLastError() }));
        }
        Ok(CompletionBinding(io as usize))
    }

    fn release_completion(&self, binding: CompletionBinding) {
        // SAFETY: binding came from CreateThreadpoolIo and is released once
        unsafe { CloseThreadpoolIo(binding.0 as PTP_IO) };
    }

    fn create_url_group(&self) -> std::result::Result<UrlGroupId, OsStatus> {
        let mut group = 0u64;
        // SAFETY: group outlives the call
        let status = unsafe { HttpCreateUrlGroup(self.session_id, &mut group, 0) };
        OsStatus::check(status)?;
        Ok(UrlGroupId(group))
    }

    fn close_url_group(&self, group: UrlGroupId) -> std::result::Result<(), OsStatus> {
        // SAFETY: id-based call
        OsStatus::check(unsafe { HttpCloseUrlGroup(group.0) })
    }

    fn add_url(&self, group: UrlGroupId, prefix: &UrlPrefix) -> std::result::Result<(), OsStatus> {
        let url = to_wide(&prefix.full_prefix());
        // SAFETY: url is NUL-terminated and lives across the call
        OsStatus::check(unsafe { HttpAddUrlToUrlGroup(group.0, url.as_ptr(), 0, 0) })
    }

    fn remove_url(&self, group: UrlGroupId, prefix: &UrlPrefix) -> std::result::Result<(), OsStatus> {
        let url = to_wide(&prefix.full_prefix());
        // SAFETY: url is NUL-terminated and lives across the call
        OsStatus::check(unsafe { HttpRemoveUrlFromUrlGroup(group.0, url.as_ptr(), 0) })
    }

    fn set_url_group_property(
        &self,
        group: UrlGroupId,
        property: UrlGroupProperty,
    ) -> std::result::Result<(), OsStatus> {
        let UrlGroupProperty::Binding(info) = property;
        let binding = HTTP_BINDING_INFO {
            Flags: HTTP_PROPERTY_FLAGS {
                _bitfield: if info.is_present() { PROPERTY_FLAG_PRESENT } else { 0 },
            },
            RequestQueueHandle: info.queue().map_or(0, raw_handle),
        };

        // SAFETY: binding lives across the call and its size is passed
        let status = unsafe {
            HttpSetUrlGroupProperty(
                group.0,
                HttpServerBindingProperty,
                &binding as *const HTTP_BINDING_INFO as *const c_void,
                size_of::<HTTP_BINDING_INFO>() as u32,
            )
        };
        OsStatus::check(status)
    }

    fn find_url_group_id(
        &self,
        prefix: &UrlPrefix,
        handle: RawQueueHandle,
    ) -> std::result::Result<UrlGroupId, OsStatus> {
        let url = to_wide(&prefix.full_prefix());
        let mut group = 0u64;
        // SAFETY: url is NUL-terminated; group outlives the call
        let status = unsafe { HttpFindUrlGroupId(url.as_ptr(), raw_handle(handle), &mut group) };
        OsStatus::check(status)?;
        Ok(UrlGroupId(group))
    }
}

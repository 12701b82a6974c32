// ============================================================================
// Mock Implementations for Testing
// ============================================================================
//
// InMemoryHttpDriver emulates the kernel side of HTTP.sys inside the process:
// named request queues are reference counted by open handles, URL groups route
// requests to at most one bound queue, and every call is journaled so tests
// can assert on ordering and on the absence of calls.

use super::HttpDriver;
use crate::domain::{
    CompletionBinding, CompletionModes, CreateFlags, Http503Verbosity, HttpApiVersion, OsStatus,
    RawQueueHandle, RequestQueueProperty, UrlGroupId, UrlGroupProperty, UrlPrefix,
};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Longest queue name the emulated kernel accepts
pub const MAX_QUEUE_NAME_LEN: usize = 255;

/// Driver operations that can have failures injected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverOp {
    CreateRequestQueue,
    CloseRequestQueue,
    SetRequestQueueProperty,
    SetCompletionNotificationModes,
    BindCompletion,
    CreateUrlGroup,
    CloseUrlGroup,
    AddUrl,
    RemoveUrl,
    SetUrlGroupProperty,
    FindUrlGroupId,
}

/// One journaled driver call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCall {
    CreateRequestQueue {
        name: Option<String>,
        flags: CreateFlags,
    },
    CloseRequestQueue(RawQueueHandle),
    SetRequestQueueProperty(RawQueueHandle, RequestQueueProperty),
    SetCompletionNotificationModes(RawQueueHandle, CompletionModes),
    BindCompletion(RawQueueHandle),
    ReleaseCompletion(CompletionBinding),
    CreateUrlGroup,
    CloseUrlGroup(UrlGroupId),
    AddUrl(UrlGroupId, String),
    RemoveUrl(UrlGroupId, String),
    SetUrlGroupProperty(UrlGroupId, UrlGroupProperty),
    FindUrlGroupId(String, RawQueueHandle),
}

/// Where the emulated kernel sends a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Delivered to a queue (its name, `None` if anonymous)
    Delivered(Option<String>),
    /// Prefix registered but no queue bound: 503
    ServiceUnavailable,
    /// No registered prefix matches: 404
    NoMatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum QueueKey {
    Named(String),
    Anonymous(u64),
}

impl QueueKey {
    fn name(&self) -> Option<String> {
        match self {
            QueueKey::Named(name) => Some(name.clone()),
            QueueKey::Anonymous(_) => None,
        }
    }
}

#[derive(Debug, Default)]
struct KernelQueue {
    open_handles: usize,
    max_length: Option<u32>,
    verbosity: Option<Http503Verbosity>,
}

#[derive(Debug)]
struct OpenHandle {
    queue: QueueKey,
    completion_modes: CompletionModes,
    binding: Option<CompletionBinding>,
}

#[derive(Debug, Default)]
struct KernelUrlGroup {
    prefixes: Vec<UrlPrefix>,
    bound_queue: Option<QueueKey>,
}

#[derive(Debug, Default)]
struct KernelState {
    next_handle: usize,
    next_binding: usize,
    next_group: u64,
    next_anonymous: u64,
    queues: HashMap<QueueKey, KernelQueue>,
    handles: HashMap<RawQueueHandle, OpenHandle>,
    bindings: HashMap<CompletionBinding, RawQueueHandle>,
    groups: HashMap<UrlGroupId, KernelUrlGroup>,
    injected: HashMap<DriverOp, VecDeque<OsStatus>>,
    journal: Vec<DriverCall>,
    closed_while_bound: usize,
}

impl KernelState {
    fn take_injected(&mut self, op: DriverOp) -> Result<(), OsStatus> {
        match self.injected.get_mut(&op).and_then(VecDeque::pop_front) {
            Some(status) => Err(status),
            None => Ok(()),
        }
    }

    fn queue_of(&self, handle: RawQueueHandle) -> Result<QueueKey, OsStatus> {
        self.handles
            .get(&handle)
            .map(|open| open.queue.clone())
            .ok_or(OsStatus::INVALID_HANDLE)
    }

    fn is_listening(&self, queue: &QueueKey) -> bool {
        self.groups
            .values()
            .any(|group| group.bound_queue.as_ref() == Some(queue))
    }
}

fn is_valid_queue_name(name: &str) -> bool {
    name.len() <= MAX_QUEUE_NAME_LEN
        && !name
            .chars()
            .any(|c| c == '/' || c == '\\' || c.is_control())
}

/// In-memory HTTP.sys emulation
pub struct InMemoryHttpDriver {
    state: Mutex<KernelState>,
}

impl InMemoryHttpDriver {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(KernelState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, KernelState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make the next call of `op` fail with `status`
    ///
    /// Multiple injections for the same op are consumed in order.
    pub fn fail_next(&self, op: DriverOp, status: OsStatus) {
        self.state()
            .injected
            .entry(op)
            .or_default()
            .push_back(status);
    }

    /// Every call made so far, oldest first
    pub fn calls(&self) -> Vec<DriverCall> {
        self.state().journal.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state().journal.len()
    }

    pub fn clear_calls(&self) {
        self.state().journal.clear();
    }

    /// Handles currently open across all queues
    pub fn open_handle_count(&self) -> usize {
        self.state().handles.len()
    }

    /// Completion bindings not yet released
    pub fn active_binding_count(&self) -> usize {
        self.state().bindings.len()
    }

    /// Handles that were closed while their completion binding was still live
    pub fn closed_while_bound_count(&self) -> usize {
        self.state().closed_while_bound
    }

    pub fn queue_exists(&self, name: &str) -> bool {
        self.state()
            .queues
            .contains_key(&QueueKey::Named(name.to_string()))
    }

    /// Open handles referencing the named queue
    pub fn queue_handle_count(&self, name: &str) -> usize {
        self.state()
            .queues
            .get(&QueueKey::Named(name.to_string()))
            .map_or(0, |queue| queue.open_handles)
    }

    pub fn queue_max_length(&self, name: &str) -> Option<u32> {
        self.state()
            .queues
            .get(&QueueKey::Named(name.to_string()))
            .and_then(|queue| queue.max_length)
    }

    pub fn queue_verbosity(&self, name: &str) -> Option<Http503Verbosity> {
        self.state()
            .queues
            .get(&QueueKey::Named(name.to_string()))
            .and_then(|queue| queue.verbosity)
    }

    pub fn completion_modes(&self, handle: RawQueueHandle) -> Option<CompletionModes> {
        self.state()
            .handles
            .get(&handle)
            .map(|open| open.completion_modes)
    }

    pub fn url_group_exists(&self, group: UrlGroupId) -> bool {
        self.state().groups.contains_key(&group)
    }

    /// Route a request URL the way the kernel would
    ///
    /// Host class decides first: strong '+', then an explicit host, then
    /// weak '*'. Within a class the longest matching path wins.
    pub fn route(&self, url: &str) -> RouteOutcome {
        let state = self.state();
        let best = state
            .groups
            .values()
            .flat_map(|group| {
                group
                    .prefixes
                    .iter()
                    .filter(move |prefix| prefix.matches(url))
                    .map(move |prefix| (prefix, group))
            })
            .max_by_key(|(prefix, _)| (prefix.host_rank(), prefix.path().len()));

        match best {
            None => RouteOutcome::NoMatch,
            Some((_, group)) => match &group.bound_queue {
                Some(queue) => RouteOutcome::Delivered(queue.name()),
                None => RouteOutcome::ServiceUnavailable,
            },
        }
    }
}

impl Default for InMemoryHttpDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpDriver for InMemoryHttpDriver {
    fn create_request_queue(
        &self,
        version: HttpApiVersion,
        name: Option<&str>,
        flags: CreateFlags,
    ) -> Result<RawQueueHandle, OsStatus> {
        let mut state = self.state();
        state.journal.push(DriverCall::CreateRequestQueue {
            name: name.map(str::to_string),
            flags,
        });
        state.take_injected(DriverOp::CreateRequestQueue)?;

        if version != HttpApiVersion::V2 {
            return Err(OsStatus::NOT_SUPPORTED);
        }
        if let Some(name) = name {
            if !is_valid_queue_name(name) {
                return Err(OsStatus::INVALID_NAME);
            }
        }

        let open_existing = flags.contains(CreateFlags::OPEN_EXISTING);
        if flags.contains(CreateFlags::DELEGATION) && !open_existing {
            return Err(OsStatus::INVALID_PARAMETER);
        }

        let key = match (name, open_existing) {
            (None, true) => return Err(OsStatus::INVALID_PARAMETER),
            (None, false) => {
                state.next_anonymous += 1;
                QueueKey::Anonymous(state.next_anonymous)
            }
            (Some(name), true) => {
                let key = QueueKey::Named(name.to_string());
                if !state.queues.contains_key(&key) {
                    return Err(OsStatus::FILE_NOT_FOUND);
                }
                key
            }
            (Some(name), false) => {
                let key = QueueKey::Named(name.to_string());
                if state.queues.contains_key(&key) {
                    return Err(OsStatus::ALREADY_EXISTS);
                }
                key
            }
        };

        state.queues.entry(key.clone()).or_default().open_handles += 1;
        state.next_handle += 1;
        let handle = RawQueueHandle(state.next_handle);
        state.handles.insert(
            handle,
            OpenHandle {
                queue: key,
                completion_modes: CompletionModes::default(),
                binding: None,
            },
        );
        Ok(handle)
    }

    fn close_request_queue(&self, handle: RawQueueHandle) -> Result<(), OsStatus> {
        let mut state = self.state();
        state.journal.push(DriverCall::CloseRequestQueue(handle));
        state.take_injected(DriverOp::CloseRequestQueue)?;

        let open = state
            .handles
            .remove(&handle)
            .ok_or(OsStatus::INVALID_HANDLE)?;
        if let Some(binding) = open.binding {
            state.closed_while_bound += 1;
            state.bindings.remove(&binding);
        }

        let last_handle = match state.queues.get_mut(&open.queue) {
            Some(queue) => {
                queue.open_handles -= 1;
                queue.open_handles == 0
            }
            None => false,
        };
        if last_handle {
            state.queues.remove(&open.queue);
            for group in state.groups.values_mut() {
                if group.bound_queue.as_ref() == Some(&open.queue) {
                    group.bound_queue = None;
                }
            }
        }
        Ok(())
    }

    fn set_request_queue_property(
        &self,
        handle: RawQueueHandle,
        property: RequestQueueProperty,
    ) -> Result<(), OsStatus> {
        let mut state = self.state();
        state
            .journal
            .push(DriverCall::SetRequestQueueProperty(handle, property));
        state.take_injected(DriverOp::SetRequestQueueProperty)?;

        let key = state.queue_of(handle)?;
        // The queue only accepts tuning once something routes to it
        if !state.is_listening(&key) {
            return Err(OsStatus::INVALID_PARAMETER);
        }

        let queue = state
            .queues
            .get_mut(&key)
            .ok_or(OsStatus::INVALID_HANDLE)?;
        match property {
            RequestQueueProperty::MaxLength(0) => return Err(OsStatus::INVALID_PARAMETER),
            RequestQueueProperty::MaxLength(length) => queue.max_length = Some(length),
            RequestQueueProperty::RejectionVerbosity(level) => queue.verbosity = Some(level),
        }
        Ok(())
    }

    fn set_completion_notification_modes(
        &self,
        handle: RawQueueHandle,
        modes: CompletionModes,
    ) -> Result<(), OsStatus> {
        let mut state = self.state();
        state
            .journal
            .push(DriverCall::SetCompletionNotificationModes(handle, modes));
        state.take_injected(DriverOp::SetCompletionNotificationModes)?;

        let open = state
            .handles
            .get_mut(&handle)
            .ok_or(OsStatus::INVALID_HANDLE)?;
        open.completion_modes = modes;
        Ok(())
    }

    fn bind_completion(&self, handle: RawQueueHandle) -> Result<CompletionBinding, OsStatus> {
        let mut state = self.state();
        state.journal.push(DriverCall::BindCompletion(handle));
        state.take_injected(DriverOp::BindCompletion)?;

        state.next_binding += 1;
        let binding = CompletionBinding(state.next_binding);
        let open = state
            .handles
            .get_mut(&handle)
            .ok_or(OsStatus::INVALID_HANDLE)?;
        // A handle can be associated with one completion target only
        if open.binding.is_some() {
            return Err(OsStatus::INVALID_PARAMETER);
        }
        open.binding = Some(binding);
        state.bindings.insert(binding, handle);
        Ok(binding)
    }

    fn release_completion(&self, binding: CompletionBinding) {
        let mut state = self.state();
        state.journal.push(DriverCall::ReleaseCompletion(binding));

        if let Some(handle) = state.bindings.remove(&binding) {
            if let Some(open) = state.handles.get_mut(&handle) {
                open.binding = None;
            }
        }
    }

    fn create_url_group(&self) -> Result<UrlGroupId, OsStatus> {
        let mut state = self.state();
        state.journal.push(DriverCall::CreateUrlGroup);
        state.take_injected(DriverOp::CreateUrlGroup)?;

        state.next_group += 1;
        let group = UrlGroupId(0xFF00_0000_0000_0000 | state.next_group);
        state.groups.insert(group, KernelUrlGroup::default());
        Ok(group)
    }

    fn close_url_group(&self, group: UrlGroupId) -> Result<(), OsStatus> {
        let mut state = self.state();
        state.journal.push(DriverCall::CloseUrlGroup(group));
        state.take_injected(DriverOp::CloseUrlGroup)?;

        state
            .groups
            .remove(&group)
            .map(|_| ())
            .ok_or(OsStatus::INVALID_PARAMETER)
    }

    fn add_url(&self, group: UrlGroupId, prefix: &UrlPrefix) -> Result<(), OsStatus> {
        let mut state = self.state();
        state
            .journal
            .push(DriverCall::AddUrl(group, prefix.full_prefix()));
        state.take_injected(DriverOp::AddUrl)?;

        let taken = state
            .groups
            .values()
            .any(|existing| existing.prefixes.contains(prefix));
        if taken {
            return Err(OsStatus::ALREADY_EXISTS);
        }
        state
            .groups
            .get_mut(&group)
            .ok_or(OsStatus::INVALID_PARAMETER)?
            .prefixes
            .push(prefix.clone());
        Ok(())
    }

    fn remove_url(&self, group: UrlGroupId, prefix: &UrlPrefix) -> Result<(), OsStatus> {
        let mut state = self.state();
        state
            .journal
            .push(DriverCall::RemoveUrl(group, prefix.full_prefix()));
        state.take_injected(DriverOp::RemoveUrl)?;

        let entry = state
            .groups
            .get_mut(&group)
            .ok_or(OsStatus::INVALID_PARAMETER)?;
        let before = entry.prefixes.len();
        entry.prefixes.retain(|existing| existing != prefix);
        if entry.prefixes.len() == before {
            return Err(OsStatus::FILE_NOT_FOUND);
        }
        Ok(())
    }

    fn set_url_group_property(
        &self,
        group: UrlGroupId,
        property: UrlGroupProperty,
    ) -> Result<(), OsStatus> {
        let mut state = self.state();
        state
            .journal
            .push(DriverCall::SetUrlGroupProperty(group, property));
        state.take_injected(DriverOp::SetUrlGroupProperty)?;

        let UrlGroupProperty::Binding(info) = property;
        let bound_queue = match info.queue() {
            Some(handle) => Some(state.queue_of(handle)?),
            None => None,
        };
        state
            .groups
            .get_mut(&group)
            .ok_or(OsStatus::INVALID_PARAMETER)?
            .bound_queue = bound_queue;
        Ok(())
    }

    fn find_url_group_id(
        &self,
        prefix: &UrlPrefix,
        handle: RawQueueHandle,
    ) -> Result<UrlGroupId, OsStatus> {
        let mut state = self.state();
        state
            .journal
            .push(DriverCall::FindUrlGroupId(prefix.full_prefix(), handle));
        state.take_injected(DriverOp::FindUrlGroupId)?;

        let key = state.queue_of(handle)?;
        state
            .groups
            .iter()
            .find(|(_, group)| {
                group.bound_queue.as_ref() == Some(&key) && group.prefixes.contains(prefix)
            })
            .map(|(id, _)| *id)
            .ok_or(OsStatus::FILE_NOT_FOUND)
    }
}

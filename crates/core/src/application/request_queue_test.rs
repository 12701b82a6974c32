//! Unit tests for the request queue lifecycle

use super::constants::REQUEST_QUEUE_OBJECT;
use super::*;
use crate::domain::{
    BindingInfo, CompletionModes, CreateFlags, Http503Verbosity, OsStatus, RequestQueueMode,
    RequestQueueProperty, UrlGroupProperty, UrlPrefix,
};
use crate::error::{ErrorKind, QueueError};
use crate::port::{DriverCall, DriverOp, InMemoryHttpDriver, RouteOutcome};
use std::sync::Arc;

const PREFIX: &str = "http://localhost:5000/";

struct Fixture {
    driver: Arc<InMemoryHttpDriver>,
    group: UrlGroup,
}

fn fixture() -> Fixture {
    let driver = Arc::new(InMemoryHttpDriver::new());
    let group = UrlGroup::create(driver.clone()).unwrap();
    group
        .register_prefix(UrlPrefix::parse(PREFIX).unwrap())
        .unwrap();
    driver.clear_calls();
    Fixture { driver, group }
}

impl Fixture {
    fn queue(&self, name: Option<&str>, mode: RequestQueueMode) -> crate::Result<RequestQueue> {
        RequestQueue::new(
            self.driver.clone(),
            self.group.id(),
            name,
            mode,
            &RequestQueueOptions::default(),
        )
    }
}

#[test]
fn test_create_sets_created_and_binds() {
    let fx = fixture();
    let queue = fx.queue(Some("q1"), RequestQueueMode::Create).unwrap();

    assert!(queue.created());
    assert_eq!(queue.name(), Some("q1"));
    assert_eq!(queue.mode(), RequestQueueMode::Create);
    assert!(!queue.is_disposed());
    assert_eq!(fx.driver.active_binding_count(), 1);

    let handle = queue.handle().unwrap();
    assert_eq!(
        fx.driver.completion_modes(handle),
        Some(
            CompletionModes::SKIP_COMPLETION_PORT_ON_SUCCESS
                | CompletionModes::SKIP_SET_EVENT_ON_HANDLE
        )
    );
}

#[test]
fn test_create_twice_fails_with_already_exists() {
    let fx = fixture();
    let _first = fx.queue(Some("q1"), RequestQueueMode::Create).unwrap();

    let err = fx.queue(Some("q1"), RequestQueueMode::Create).unwrap_err();
    assert_eq!(err, QueueError::OsOperationFailed(OsStatus::ALREADY_EXISTS));
    assert_eq!(err.kind(), ErrorKind::OsOperationFailed);

    // Create mode never retries as attach
    let creates = fx
        .driver
        .calls()
        .into_iter()
        .filter(|call| matches!(call, DriverCall::CreateRequestQueue { .. }))
        .count();
    assert_eq!(creates, 2);
}

#[test]
fn test_create_or_attach_twice() {
    let fx = fixture();
    let first = fx.queue(Some("q1"), RequestQueueMode::CreateOrAttach).unwrap();
    let second = fx.queue(Some("q1"), RequestQueueMode::CreateOrAttach).unwrap();

    assert!(first.created());
    assert!(!second.created());
    assert_eq!(fx.driver.queue_handle_count("q1"), 2);

    let last_create = fx
        .driver
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            DriverCall::CreateRequestQueue { flags, .. } => Some(flags),
            _ => None,
        })
        .last();
    assert_eq!(last_create, Some(CreateFlags::OPEN_EXISTING));
}

#[test]
fn test_attach_to_missing_queue_is_not_found() {
    let fx = fixture();
    let err = fx.queue(Some("missing"), RequestQueueMode::Attach).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::QueueNotFound);
    assert!(err.to_string().contains("'missing'"));
    assert_eq!(fx.driver.open_handle_count(), 0);
}

#[test]
fn test_attach_existing_queue() {
    let fx = fixture();
    let owner = fx.queue(Some("shared"), RequestQueueMode::Create).unwrap();
    let attached = fx.queue(Some("shared"), RequestQueueMode::Attach).unwrap();

    assert!(owner.created());
    assert!(!attached.created());
    assert_ne!(owner.handle().unwrap(), attached.handle().unwrap());
}

#[test]
fn test_invalid_name_in_every_mode() {
    let fx = fixture();
    for mode in [
        RequestQueueMode::Create,
        RequestQueueMode::Attach,
        RequestQueueMode::CreateOrAttach,
    ] {
        let err = fx.queue(Some("bad/name"), mode).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidName, "mode {mode}");
        assert_eq!(err.os_status(), Some(OsStatus::INVALID_NAME));
    }
    assert_eq!(fx.driver.open_handle_count(), 0);
}

#[test]
fn test_empty_name_is_anonymous() {
    let fx = fixture();
    let queue = fx.queue(Some(""), RequestQueueMode::Create).unwrap();

    assert_eq!(queue.name(), None);
    assert!(queue.created());
    assert_eq!(
        fx.driver.calls().first(),
        Some(&DriverCall::CreateRequestQueue {
            name: None,
            flags: CreateFlags::NONE,
        })
    );
}

#[test]
fn test_other_create_failures_are_generic() {
    let fx = fixture();
    fx.driver
        .fail_next(DriverOp::CreateRequestQueue, OsStatus::ACCESS_DENIED);

    let err = fx.queue(Some("q1"), RequestQueueMode::CreateOrAttach).unwrap_err();
    assert_eq!(err, QueueError::OsOperationFailed(OsStatus::ACCESS_DENIED));
}

#[test]
fn test_completion_mode_failure_releases_handle() {
    let fx = fixture();
    fx.driver.fail_next(
        DriverOp::SetCompletionNotificationModes,
        OsStatus::NOT_SUPPORTED,
    );

    let err = fx.queue(Some("q1"), RequestQueueMode::Create).unwrap_err();
    assert_eq!(err, QueueError::OsOperationFailed(OsStatus::NOT_SUPPORTED));
    assert_eq!(fx.driver.open_handle_count(), 0);
    assert!(!fx.driver.queue_exists("q1"));
}

#[test]
fn test_skip_completion_can_be_disabled() {
    let fx = fixture();
    let options = RequestQueueOptions {
        skip_completion_on_success: false,
    };
    let _queue = RequestQueue::new(
        fx.driver.clone(),
        fx.group.id(),
        Some("q1"),
        RequestQueueMode::Create,
        &options,
    )
    .unwrap();

    assert!(!fx
        .driver
        .calls()
        .iter()
        .any(|call| matches!(call, DriverCall::SetCompletionNotificationModes(..))));
}

#[test]
fn test_bind_failure_releases_handle() {
    let fx = fixture();
    fx.driver
        .fail_next(DriverOp::BindCompletion, OsStatus::INVALID_PARAMETER);

    let err = fx.queue(Some("q1"), RequestQueueMode::Create).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OsOperationFailed);
    assert_eq!(fx.driver.open_handle_count(), 0);
    assert_eq!(fx.driver.active_binding_count(), 0);
}

#[test]
fn test_dispose_releases_binding_before_handle() {
    let fx = fixture();
    let queue = fx.queue(Some("q1"), RequestQueueMode::Create).unwrap();
    let handle = queue.handle().unwrap();
    let binding = queue.completion_binding().unwrap();
    fx.driver.clear_calls();

    queue.dispose();

    assert_eq!(
        fx.driver.calls(),
        vec![
            DriverCall::ReleaseCompletion(binding),
            DriverCall::CloseRequestQueue(handle),
        ]
    );
    assert_eq!(fx.driver.closed_while_bound_count(), 0);
}

#[test]
fn test_dispose_is_idempotent() {
    let fx = fixture();
    let queue = fx.queue(Some("q1"), RequestQueueMode::Create).unwrap();

    queue.dispose();
    queue.dispose();
    assert!(queue.is_disposed());
    drop(queue);

    let closes = fx
        .driver
        .calls()
        .into_iter()
        .filter(|call| matches!(call, DriverCall::CloseRequestQueue(_)))
        .count();
    assert_eq!(closes, 1);
    assert_eq!(fx.driver.open_handle_count(), 0);
}

#[test]
fn test_drop_disposes() {
    let fx = fixture();
    {
        let _queue = fx.queue(Some("q1"), RequestQueueMode::Create).unwrap();
        assert!(fx.driver.queue_exists("q1"));
    }
    assert!(!fx.driver.queue_exists("q1"));
    assert_eq!(fx.driver.active_binding_count(), 0);
}

#[test]
fn test_disposing_attached_peer_keeps_kernel_queue() {
    let fx = fixture();
    let owner = fx.queue(Some("q1"), RequestQueueMode::Create).unwrap();
    let peer = fx.queue(Some("q1"), RequestQueueMode::Attach).unwrap();

    peer.dispose();
    assert!(fx.driver.queue_exists("q1"));
    assert!(owner.handle().is_ok());

    owner.dispose();
    assert!(!fx.driver.queue_exists("q1"));
}

#[test]
fn test_attach_then_detach_restores_routing() {
    let fx = fixture();
    let queue = fx.queue(Some("web"), RequestQueueMode::Create).unwrap();
    let url = "http://localhost:5000/index.html";

    assert_eq!(fx.driver.route(url), RouteOutcome::ServiceUnavailable);

    queue.attach_to_url_group().unwrap();
    assert_eq!(
        fx.driver.route(url),
        RouteOutcome::Delivered(Some("web".to_string()))
    );

    queue.detach_from_url_group().unwrap();
    assert_eq!(fx.driver.route(url), RouteOutcome::ServiceUnavailable);

    // Stop then abort
    queue.detach_from_url_group().unwrap();
    assert_eq!(fx.driver.route(url), RouteOutcome::ServiceUnavailable);
}

#[test]
fn test_attach_sets_binding_property() {
    let fx = fixture();
    let queue = fx.queue(Some("web"), RequestQueueMode::Create).unwrap();
    let handle = queue.handle().unwrap();
    fx.driver.clear_calls();

    queue.attach_to_url_group().unwrap();
    queue.detach_from_url_group().unwrap();

    assert_eq!(
        fx.driver.calls(),
        vec![
            DriverCall::SetUrlGroupProperty(
                fx.group.id(),
                UrlGroupProperty::Binding(BindingInfo::bound(handle))
            ),
            DriverCall::SetUrlGroupProperty(
                fx.group.id(),
                UrlGroupProperty::Binding(BindingInfo::cleared())
            ),
        ]
    );
}

#[test]
fn test_attach_failure_propagates_detach_failure_does_not() {
    let fx = fixture();
    let queue = fx.queue(Some("web"), RequestQueueMode::Create).unwrap();

    fx.driver
        .fail_next(DriverOp::SetUrlGroupProperty, OsStatus::INVALID_PARAMETER);
    let err = queue.attach_to_url_group().unwrap_err();
    assert_eq!(err, QueueError::OsOperationFailed(OsStatus::INVALID_PARAMETER));

    fx.driver
        .fail_next(DriverOp::SetUrlGroupProperty, OsStatus::INVALID_PARAMETER);
    assert!(queue.detach_from_url_group().is_ok());
}

#[test]
fn test_properties_after_attach() {
    let fx = fixture();
    let queue = fx.queue(Some("q1"), RequestQueueMode::Create).unwrap();
    queue.attach_to_url_group().unwrap();

    queue.set_length_limit(1000).unwrap();
    queue.set_rejection_verbosity(Http503Verbosity::Full).unwrap();

    assert_eq!(fx.driver.queue_max_length("q1"), Some(1000));
    assert_eq!(
        fx.driver.queue_verbosity("q1"),
        Some(Http503Verbosity::Full)
    );
}

#[test]
fn test_properties_before_listening_fail() {
    let fx = fixture();
    let queue = fx.queue(Some("q1"), RequestQueueMode::Create).unwrap();

    let err = queue.set_length_limit(1000).unwrap_err();
    assert_eq!(err, QueueError::OsOperationFailed(OsStatus::INVALID_PARAMETER));

    let err = queue
        .set_rejection_verbosity(Http503Verbosity::Limited)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OsOperationFailed);
}

#[test]
fn test_operations_after_dispose_make_no_os_calls() {
    let fx = fixture();
    let queue = fx.queue(Some("q1"), RequestQueueMode::Create).unwrap();
    queue.dispose();
    fx.driver.clear_calls();

    let disposed = QueueError::Disposed(REQUEST_QUEUE_OBJECT);
    assert_eq!(queue.attach_to_url_group().unwrap_err(), disposed);
    assert_eq!(queue.detach_from_url_group().unwrap_err(), disposed);
    assert_eq!(queue.set_length_limit(10).unwrap_err(), disposed);
    assert_eq!(
        queue
            .set_rejection_verbosity(Http503Verbosity::Basic)
            .unwrap_err(),
        disposed
    );
    assert_eq!(queue.handle().unwrap_err(), disposed);
    assert_eq!(disposed.kind(), ErrorKind::ProgrammingError);

    assert_eq!(fx.driver.call_count(), 0);
}

#[test]
#[should_panic(expected = "requires a request queue created by this instance")]
fn test_attach_on_attached_instance_panics() {
    let fx = fixture();
    let _owner = fx.queue(Some("q1"), RequestQueueMode::Create).unwrap();
    let attached = fx.queue(Some("q1"), RequestQueueMode::Attach).unwrap();

    let _ = attached.attach_to_url_group();
}

#[test]
#[should_panic(expected = "requires a request queue created by this instance")]
fn test_length_limit_on_attached_instance_panics() {
    let fx = fixture();
    let _owner = fx.queue(Some("q1"), RequestQueueMode::Create).unwrap();
    let attached = fx.queue(Some("q1"), RequestQueueMode::CreateOrAttach).unwrap();

    let _ = attached.set_length_limit(5);
}

#[test]
fn test_receiver_resolves_url_group() {
    let fx = fixture();
    let owner = fx.queue(Some("delegated"), RequestQueueMode::Create).unwrap();
    owner.attach_to_url_group().unwrap();

    let receiver = RequestQueue::open_receiver(
        fx.driver.clone(),
        "delegated",
        PREFIX,
        &RequestQueueOptions::default(),
    )
    .unwrap();

    assert!(!receiver.created());
    assert_eq!(receiver.url_group(), fx.group.id());
    assert!(fx.driver.calls().iter().any(|call| matches!(
        call,
        DriverCall::CreateRequestQueue { flags, .. }
            if *flags == CreateFlags::OPEN_EXISTING | CreateFlags::DELEGATION
    )));
}

#[test]
fn test_receiver_lookup_failure_releases_handle() {
    let fx = fixture();
    let _owner = fx.queue(Some("delegated"), RequestQueueMode::Create).unwrap();

    // Not attached, so no group routes the prefix to this queue
    let err = RequestQueue::open_receiver(
        fx.driver.clone(),
        "delegated",
        PREFIX,
        &RequestQueueOptions::default(),
    )
    .unwrap_err();

    assert_eq!(err, QueueError::OsOperationFailed(OsStatus::FILE_NOT_FOUND));
    assert_eq!(fx.driver.queue_handle_count("delegated"), 1);
}

#[test]
fn test_receiver_rejects_bad_prefix_without_os_calls() {
    let fx = fixture();
    let err = RequestQueue::open_receiver(
        fx.driver.clone(),
        "delegated",
        "not-a-prefix",
        &RequestQueueOptions::default(),
    )
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(fx.driver.call_count(), 0);
}

#[test]
fn test_concurrent_create_or_attach_has_one_creator() {
    let fx = fixture();
    let group = fx.group.id();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let driver = fx.driver.clone();
            std::thread::spawn(move || {
                RequestQueue::new(
                    driver,
                    group,
                    Some("raced"),
                    RequestQueueMode::CreateOrAttach,
                    &RequestQueueOptions::default(),
                )
                .unwrap()
            })
        })
        .collect();

    let queues: Vec<RequestQueue> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(queues.iter().filter(|q| q.created()).count(), 1);
    assert_eq!(fx.driver.queue_handle_count("raced"), 8);
}

#[test]
fn test_concurrent_dispose_closes_once() {
    let fx = fixture();
    let queue = Arc::new(fx.queue(Some("q1"), RequestQueueMode::Create).unwrap());

    let threads: Vec<_> = (0..4)
        .map(|_| {
            let queue = Arc::clone(&queue);
            std::thread::spawn(move || queue.dispose())
        })
        .collect();
    for thread in threads {
        thread.join().unwrap();
    }

    let closes = fx
        .driver
        .calls()
        .into_iter()
        .filter(|call| matches!(call, DriverCall::CloseRequestQueue(_)))
        .count();
    assert_eq!(closes, 1);
}

#[test]
fn test_length_limit_property_value() {
    let fx = fixture();
    let queue = fx.queue(Some("q1"), RequestQueueMode::Create).unwrap();
    queue.attach_to_url_group().unwrap();
    let handle = queue.handle().unwrap();
    fx.driver.clear_calls();

    queue.set_length_limit(42).unwrap();
    assert_eq!(
        fx.driver.calls(),
        vec![DriverCall::SetRequestQueueProperty(
            handle,
            RequestQueueProperty::MaxLength(42)
        )]
    );
}

mod attach_event {
    use super::*;
    use super::super::constants::ATTACHED_TO_QUEUE_EVENT;
    use crate::domain::{
        CompletionBinding, HttpApiVersion, RawQueueHandle, UrlGroupId,
    };
    use crate::port::HttpDriver;
    use std::io;
    use std::sync::Mutex;

    /// Formatted log output shared with the subscriber
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn attach_events(&self) -> Vec<String> {
            String::from_utf8(self.0.lock().unwrap().clone())
                .unwrap()
                .lines()
                .filter(|line| line.contains(ATTACHED_TO_QUEUE_EVENT))
                .map(str::to_string)
                .collect()
        }
    }

    fn capture<T>(f: impl FnOnce() -> T) -> (T, Captured) {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();
        let out = tracing::subscriber::with_default(subscriber, f);
        (out, captured)
    }

    /// Lets anonymous queues be reopened, which the emulated kernel refuses
    struct AnonymousReopenDriver {
        inner: InMemoryHttpDriver,
    }

    impl HttpDriver for AnonymousReopenDriver {
        fn create_request_queue(
            &self,
            version: HttpApiVersion,
            name: Option<&str>,
            flags: CreateFlags,
        ) -> std::result::Result<RawQueueHandle, OsStatus> {
            let flags = if name.is_none() { CreateFlags::NONE } else { flags };
            self.inner.create_request_queue(version, name, flags)
        }

        fn close_request_queue(&self, handle: RawQueueHandle) -> std::result::Result<(), OsStatus> {
            self.inner.close_request_queue(handle)
        }

        fn set_request_queue_property(
            &self,
            handle: RawQueueHandle,
            property: RequestQueueProperty,
        ) -> std::result::Result<(), OsStatus> {
            self.inner.set_request_queue_property(handle, property)
        }

        fn set_completion_notification_modes(
            &self,
            handle: RawQueueHandle,
            modes: CompletionModes,
        ) -> std::result::Result<(), OsStatus> {
            self.inner.set_completion_notification_modes(handle, modes)
        }

        fn bind_completion(
            &self,
            handle: RawQueueHandle,
        ) -> std::result::Result<CompletionBinding, OsStatus> {
            self.inner.bind_completion(handle)
        }

        fn release_completion(&self, binding: CompletionBinding) {
            self.inner.release_completion(binding)
        }

        fn create_url_group(&self) -> std::result::Result<UrlGroupId, OsStatus> {
            self.inner.create_url_group()
        }

        fn close_url_group(&self, group: UrlGroupId) -> std::result::Result<(), OsStatus> {
            self.inner.close_url_group(group)
        }

        fn add_url(&self, group: UrlGroupId, prefix: &UrlPrefix) -> std::result::Result<(), OsStatus> {
            self.inner.add_url(group, prefix)
        }

        fn remove_url(
            &self,
            group: UrlGroupId,
            prefix: &UrlPrefix,
        ) -> std::result::Result<(), OsStatus> {
            self.inner.remove_url(group, prefix)
        }

        fn set_url_group_property(
            &self,
            group: UrlGroupId,
            property: UrlGroupProperty,
        ) -> std::result::Result<(), OsStatus> {
            self.inner.set_url_group_property(group, property)
        }

        fn find_url_group_id(
            &self,
            prefix: &UrlPrefix,
            handle: RawQueueHandle,
        ) -> std::result::Result<UrlGroupId, OsStatus> {
            self.inner.find_url_group_id(prefix, handle)
        }
    }

    #[test]
    fn test_second_create_or_attach_emits_once() {
        let fx = fixture();
        let (queues, captured) = capture(|| {
            let first = fx.queue(Some("q1"), RequestQueueMode::CreateOrAttach).unwrap();
            let second = fx.queue(Some("q1"), RequestQueueMode::CreateOrAttach).unwrap();
            (first, second)
        });

        assert!(queues.0.created());
        assert!(!queues.1.created());
        let events = captured.attach_events();
        assert_eq!(events.len(), 1, "{:?}", events);
        assert!(events[0].contains("INFO"));
        assert!(events[0].contains(r#"Some("q1")"#));
    }

    #[test]
    fn test_attach_mode_emits() {
        let fx = fixture();
        let _owner = fx.queue(Some("shared"), RequestQueueMode::Create).unwrap();

        let (_peer, captured) =
            capture(|| fx.queue(Some("shared"), RequestQueueMode::Attach).unwrap());

        let events = captured.attach_events();
        assert_eq!(events.len(), 1);
        assert!(events[0].contains(r#"Some("shared")"#));
    }

    #[test]
    fn test_create_path_emits_nothing() {
        let fx = fixture();
        let (_queues, captured) = capture(|| {
            (
                fx.queue(Some("q1"), RequestQueueMode::Create).unwrap(),
                fx.queue(Some("q2"), RequestQueueMode::CreateOrAttach).unwrap(),
                fx.queue(None, RequestQueueMode::Create).unwrap(),
            )
        });

        assert!(captured.attach_events().is_empty());
    }

    #[test]
    fn test_anonymous_attach_emits_without_name() {
        let driver = Arc::new(AnonymousReopenDriver {
            inner: InMemoryHttpDriver::new(),
        });
        // Someone else won the race to create it
        driver
            .inner
            .fail_next(DriverOp::CreateRequestQueue, OsStatus::ALREADY_EXISTS);

        let (queue, captured) = capture(|| {
            RequestQueue::new(
                driver.clone(),
                UrlGroupId(1),
                None,
                RequestQueueMode::CreateOrAttach,
                &RequestQueueOptions::default(),
            )
            .unwrap()
        });

        assert!(!queue.created());
        assert_eq!(queue.name(), None);
        let events = captured.attach_events();
        assert_eq!(events.len(), 1);
        assert!(events[0].contains("request_queue_name=None"));
    }

    #[test]
    fn test_receiver_emits_before_group_lookup() {
        let fx = fixture();
        let _owner = fx.queue(Some("delegated"), RequestQueueMode::Create).unwrap();

        // Owner never attached, so the lookup fails after the attach
        let (result, captured) = capture(|| {
            RequestQueue::open_receiver(
                fx.driver.clone(),
                "delegated",
                PREFIX,
                &RequestQueueOptions::default(),
            )
        });

        assert!(result.is_err());
        let events = captured.attach_events();
        assert_eq!(events.len(), 1);
        assert!(events[0].contains(r#"Some("delegated")"#));
    }
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    fn any_mode() -> impl Strategy<Value = RequestQueueMode> {
        prop_oneof![
            Just(RequestQueueMode::Create),
            Just(RequestQueueMode::Attach),
            Just(RequestQueueMode::CreateOrAttach),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_names_with_separators_are_invalid(
            head in "[a-z]{0,8}",
            sep in prop_oneof![Just('/'), Just('\\')],
            tail in "[a-z]{0,8}",
            mode in any_mode(),
        ) {
            let fx = fixture();
            let name = format!("{}{}{}", head, sep, tail);
            let err = fx.queue(Some(&name), mode).unwrap_err();
            prop_assert_eq!(err.kind(), ErrorKind::InvalidName);
            prop_assert_eq!(fx.driver.open_handle_count(), 0);
        }

        #[test]
        fn prop_create_or_attach_on_existing_never_creates(name in "[a-z][a-z0-9_]{0,16}") {
            let fx = fixture();
            let _owner = fx.queue(Some(&name), RequestQueueMode::Create).unwrap();
            let second = fx.queue(Some(&name), RequestQueueMode::CreateOrAttach).unwrap();
            prop_assert!(!second.created());
        }
    }
}

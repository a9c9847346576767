//! Integration tests for common herald workflows.
//!
//! These tests cover cross-component behavior: ordering guarantees across
//! local and shared registries, stop-propagation semantics, detach scoping,
//! and subscriber bundles registering against a live engine.

use herald::*;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

/// Install a tracing subscriber so dispatch trace output from these tests
/// is visible under `RUST_LOG`. Later calls are no-ops.
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

fn tagged(tag: &str) -> Listener {
    let tag = json!(tag);
    Listener::new(move |_| tag.clone())
}

fn response_values(responses: &ResponseCollection) -> Vec<Value> {
    responses.iter().cloned().collect()
}

// =============================================================================
// Ordering guarantees
// =============================================================================

#[test]
fn test_priority_then_attachment_order() {
    init_tracing();
    let events = EventManager::new();
    events.attach("job.run", tagged("p1-first"), 1).unwrap();
    events.attach("job.run", tagged("p1-second"), 1).unwrap();
    events.attach("job.run", tagged("p5"), 5).unwrap();
    events.attach("job.run", tagged("p-neg"), -3).unwrap();

    let responses = events.trigger("job.run", None, Params::new()).unwrap();

    assert_eq!(
        response_values(&responses),
        vec![json!("p5"), json!("p1-first"), json!("p1-second"), json!("p-neg")]
    );
}

#[test]
fn test_wildcard_listener_runs_for_every_event_after_named() {
    init_tracing();
    let events = EventManager::new();
    events.attach_wildcard(tagged("wild"), 1).unwrap();
    events.attach("a", tagged("a"), 1).unwrap();
    events.attach("b", tagged("b"), 1).unwrap();

    let for_a = events.trigger("a", None, Params::new()).unwrap();
    let for_b = events.trigger("b", None, Params::new()).unwrap();
    let for_c = events.trigger("c", None, Params::new()).unwrap();

    assert_eq!(response_values(&for_a), vec![json!("a"), json!("wild")]);
    assert_eq!(response_values(&for_b), vec![json!("b"), json!("wild")]);
    assert_eq!(response_values(&for_c), vec![json!("wild")]);
}

// =============================================================================
// Shared + local merge
// =============================================================================

#[test]
fn test_engine_consults_shared_buckets_for_its_identifiers() {
    init_tracing();
    let shared = SharedListenerProvider::new();
    shared.attach("Mailer", "send", tagged("shared-send"), 1).unwrap();
    shared.attach("Mailer", WILDCARD, tagged("shared-any"), 1).unwrap();
    shared.attach(WILDCARD, "send", tagged("shared-global"), 1).unwrap();
    shared.attach("Unrelated", "send", tagged("never"), 99).unwrap();

    let events = EventManager::with_shared(shared, vec!["Mailer".into()]);
    events.attach("send", tagged("local"), 1).unwrap();

    let responses = events.trigger("send", None, Params::new()).unwrap();

    assert_eq!(
        response_values(&responses),
        vec![
            json!("local"),
            json!("shared-send"),
            json!("shared-any"),
            json!("shared-global")
        ]
    );
}

#[test]
fn test_shared_priority_beats_local_position() {
    init_tracing();
    let shared = SharedListenerProvider::new();
    shared.attach("Svc", "go", tagged("shared-high"), 10).unwrap();

    let events = EventManager::with_shared(shared.clone(), vec![]);
    events.add_identifiers(vec!["Svc".into()]);
    events.attach("go", tagged("local-low"), 1).unwrap();

    let responses = events.trigger("go", None, Params::new()).unwrap();
    assert_eq!(
        response_values(&responses),
        vec![json!("shared-high"), json!("local-low")]
    );

    // Identifier removal is observable on the next trigger.
    events.set_identifiers(vec![]);
    let responses = events.trigger("go", None, Params::new()).unwrap();
    assert_eq!(response_values(&responses), vec![json!("local-low")]);
}

#[test]
fn test_two_engines_share_one_registry() {
    init_tracing();
    let shared = SharedListenerProvider::new();
    shared.attach("Worker", "tick", tagged("observed"), 1).unwrap();

    let first = EventManager::with_shared(shared.clone(), vec!["Worker".into()]);
    let second = EventManager::with_shared(shared, vec!["Worker".into()]);

    assert_eq!(
        response_values(&first.trigger("tick", None, Params::new()).unwrap()),
        vec![json!("observed")]
    );
    assert_eq!(
        response_values(&second.trigger("tick", None, Params::new()).unwrap()),
        vec![json!("observed")]
    );
}

// =============================================================================
// Stop propagation and predicates
// =============================================================================

#[test]
fn test_stopping_listener_is_last_response() {
    init_tracing();
    let events = EventManager::new();
    events.attach("halt", tagged("before"), 4).unwrap();
    events
        .attach(
            "halt",
            Listener::new(|event| {
                event.stop_propagation(true);
                json!("stopper")
            }),
            3,
        )
        .unwrap();
    events.attach("halt", tagged("skipped-2"), 2).unwrap();
    events.attach("halt", tagged("skipped-1"), 1).unwrap();

    let responses = events.trigger("halt", None, Params::new()).unwrap();

    assert!(responses.stopped());
    assert_eq!(
        response_values(&responses),
        vec![json!("before"), json!("stopper")]
    );
}

#[test]
fn test_trigger_until_counts_invocations() {
    init_tracing();
    let events = EventManager::new();
    let invocations = Arc::new(Mutex::new(0u32));
    for (tag, priority) in [("one", 4), ("two", 3), ("three", 2), ("four", 1)] {
        let tag = json!(tag);
        let invocations = invocations.clone();
        events
            .attach(
                "scan",
                Listener::new(move |_| {
                    *invocations.lock().unwrap() += 1;
                    tag.clone()
                }),
                priority,
            )
            .unwrap();
    }

    let responses = events
        .trigger_until(|r| r == &json!("two"), "scan", None, Params::new())
        .unwrap();

    assert!(responses.stopped());
    assert_eq!(*invocations.lock().unwrap(), 2);
    assert_eq!(responses.last(), Some(&json!("two")));
}

#[test]
fn test_reused_event_resets_between_dispatches() {
    init_tracing();
    let events = EventManager::new();
    events
        .attach(
            "retry",
            Listener::new(|event| {
                event.stop_propagation(true);
                json!("ran")
            }),
            1,
        )
        .unwrap();

    let mut event = BasicEvent::named("retry");

    let first = events.trigger_event(&mut event).unwrap();
    assert!(first.stopped());
    assert!(event.propagation_is_stopped());

    // The stale flag from the first dispatch must not suppress the second.
    let second = events.trigger_event(&mut event).unwrap();
    assert_eq!(second.len(), 1);
    assert!(second.stopped());
}

// =============================================================================
// Detach scoping
// =============================================================================

#[test]
fn test_detach_scopes_across_buckets() {
    init_tracing();
    let events = EventManager::new();
    let listener = tagged("multi");
    events.attach("foo", listener.clone(), 1).unwrap();
    events.attach("bar", listener.clone(), 1).unwrap();
    events.attach_wildcard(listener.clone(), 1).unwrap();

    // Named scope: only "foo" loses the listener.
    events.detach(&listener, Some("foo")).unwrap();
    assert_eq!(
        response_values(&events.trigger("foo", None, Params::new()).unwrap()),
        vec![json!("multi")] // wildcard attachment still fires
    );
    assert_eq!(
        response_values(&events.trigger("bar", None, Params::new()).unwrap()),
        vec![json!("multi"), json!("multi")]
    );

    // Wildcard-specific scope: explicit buckets untouched.
    events.detach_wildcard(&listener).unwrap();
    assert!(events.trigger("foo", None, Params::new()).unwrap().is_empty());
    assert_eq!(
        response_values(&events.trigger("bar", None, Params::new()).unwrap()),
        vec![json!("multi")]
    );

    // No scope: gone everywhere.
    events.attach_wildcard(listener.clone(), 1).unwrap();
    events.detach(&listener, None).unwrap();
    assert!(events.trigger("bar", None, Params::new()).unwrap().is_empty());
}

// =============================================================================
// Subscribers and lazy listeners against a live engine
// =============================================================================

struct AuditSubscriber {
    attached: Mutex<Vec<Listener>>,
    log: Arc<Mutex<Vec<String>>>,
}

impl AuditSubscriber {
    fn new() -> Self {
        Self {
            attached: Mutex::new(Vec::new()),
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn recorder(&self, label: &'static str) -> Listener {
        let log = self.log.clone();
        Listener::new(move |event| {
            log.lock().unwrap().push(format!("{label}:{}", event.name()));
            Value::Null
        })
    }
}

impl ListenerSubscriber for AuditSubscriber {
    fn attach(&self, target: &dyn ListenerAttachment, priority: i32) -> Result<()> {
        let mut attached = self.attached.lock().unwrap();
        attached.push(target.attach("user.created", self.recorder("created"), priority)?);
        attached.push(target.attach("user.deleted", self.recorder("deleted"), priority + 1)?);
        Ok(())
    }

    fn detach(&self, target: &dyn ListenerAttachment) -> Result<()> {
        for listener in self.attached.lock().unwrap().drain(..) {
            target.detach(&listener, None)?;
        }
        Ok(())
    }
}

#[test]
fn test_subscriber_attaches_and_detaches_as_a_unit() {
    init_tracing();
    let events = EventManager::new();
    let subscriber = AuditSubscriber::new();

    subscriber.attach(&events, DEFAULT_PRIORITY).unwrap();
    events.trigger("user.created", None, Params::new()).unwrap();
    events.trigger("user.deleted", None, Params::new()).unwrap();
    assert_eq!(
        subscriber.log.lock().unwrap().as_slice(),
        &["created:user.created", "deleted:user.deleted"]
    );

    subscriber.detach(&events).unwrap();
    events.trigger("user.created", None, Params::new()).unwrap();
    assert_eq!(subscriber.log.lock().unwrap().len(), 2);
}

struct MapResolver;

impl ListenerResolver for MapResolver {
    fn resolve(&self, service: &str) -> Result<Listener> {
        match service {
            "notify" => Ok(tagged("notified")),
            other => Err(Error::ListenerResolution(other.to_string())),
        }
    }
}

#[test]
fn test_lazy_listener_through_manager() {
    init_tracing();
    let events = EventManager::new();
    let lazy = LazyListener::new(Arc::new(MapResolver), "notify").unwrap();

    events.attach("signup", lazy.listener(), 1).unwrap();
    let responses = events.trigger("signup", None, Params::new()).unwrap();
    assert_eq!(response_values(&responses), vec![json!("notified")]);

    // The same handle detaches what was attached.
    events.detach(&lazy.listener(), None).unwrap();
    assert!(events.trigger("signup", None, Params::new()).unwrap().is_empty());
}

// =============================================================================
// Custom event types
// =============================================================================

#[derive(Debug)]
struct OrderPlaced {
    order_id: u64,
    stopped: bool,
}

impl Event for OrderPlaced {
    fn name(&self) -> &str {
        "order.placed"
    }

    fn tags(&self) -> Vec<String> {
        vec!["order".to_string()]
    }

    fn stop_propagation(&mut self, flag: bool) {
        self.stopped = flag;
    }

    fn propagation_is_stopped(&self) -> bool {
        self.stopped
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

#[test]
fn test_typed_event_dispatch_with_tag_attachment() {
    init_tracing();
    let events = EventManager::new();
    events
        .attach(
            "order.placed",
            Listener::new(|event| {
                let order = event.as_any().downcast_ref::<OrderPlaced>().unwrap();
                json!(order.order_id)
            }),
            1,
        )
        .unwrap();
    // Attached to the event's kind tag rather than its name.
    events.attach("order", tagged("by-kind"), 1).unwrap();

    let mut event = OrderPlaced {
        order_id: 7,
        stopped: false,
    };
    let responses = events.trigger_event(&mut event).unwrap();

    assert_eq!(response_values(&responses), vec![json!(7), json!("by-kind")]);
}

//! Event manager
//!
//! The per-component notification engine: attach listeners against event
//! names, trigger events by name, and let listeners observe or short-circuit
//! behavior without compile-time coupling.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use herald::{EventManager, Listener, Params};
//! use serde_json::json;
//!
//! let events = EventManager::new();
//!
//! events.attach("order.placed", Listener::new(|event| {
//!     json!("notified")
//! }), 1)?;
//!
//! let responses = events.trigger("order.placed", None, Params::new().with("id", 42))?;
//! assert_eq!(responses.last(), Some(&json!("notified")));
//! ```
//!
//! ## Shared listeners
//!
//! ```rust,ignore
//! let shared = SharedListenerProvider::new();
//! shared.attach("OrderService", "order.placed", listener, 1)?;
//!
//! let events = EventManager::with_shared(shared, vec!["OrderService".into()]);
//! // trigger() now consults both local and shared attachments.
//! ```
//!
//! Dispatch is synchronous and call-stack-bound: `trigger` returns once every
//! applicable listener has run, or earlier when propagation is stopped. The
//! listener sequence is snapshotted before the first invocation, so listeners
//! may reentrantly attach, detach, or trigger; a listener that unconditionally
//! re-triggers its own event recurses without bound, which is the caller's
//! responsibility to avoid.

use crate::error::{Error, Result};
use crate::event::{BasicEvent, Event, EventTarget, Params};
use crate::listener::{Listener, ListenerAttachment};
use crate::provider::{
    AggregateListenerProvider, ListenerProvider, PrioritizedListenerProvider,
    SharedListenerProvider,
};
use crate::responses::ResponseCollection;
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, trace};

/// Prioritized event dispatch engine.
///
/// Cheap to clone; clones share the same listener registries and identifier
/// set, so a manager handle can be passed to every component that needs to
/// attach or trigger.
#[derive(Clone)]
pub struct EventManager {
    local: Option<PrioritizedListenerProvider>,
    provider: Arc<dyn ListenerProvider>,
    shared: Option<SharedListenerProvider>,
    identifiers: Arc<RwLock<Vec<String>>>,
}

impl EventManager {
    /// An engine over its own local listener registry.
    pub fn new() -> Self {
        let local = PrioritizedListenerProvider::new();
        Self {
            provider: Arc::new(local.clone()),
            local: Some(local),
            shared: None,
            identifiers: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// An engine that additionally consults `shared` under the given
    /// identifiers. Locally attached listeners precede shared ones at equal
    /// priority.
    pub fn with_shared(shared: SharedListenerProvider, identifiers: Vec<String>) -> Self {
        let local = PrioritizedListenerProvider::new();
        let provider = AggregateListenerProvider::new(vec![
            Arc::new(local.clone()),
            Arc::new(shared.clone()),
        ]);
        Self {
            provider: Arc::new(provider),
            local: Some(local),
            shared: Some(shared),
            identifiers: Arc::new(RwLock::new(dedupe(identifiers))),
        }
    }

    /// A dispatch-only engine over an externally managed provider. The
    /// attach family fails on such an engine; attach listeners to the
    /// provider directly before composing it.
    pub fn with_provider(provider: Arc<dyn ListenerProvider>) -> Self {
        Self {
            local: None,
            provider,
            shared: None,
            identifiers: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// The shared provider this engine consults, if any.
    pub fn shared(&self) -> Option<&SharedListenerProvider> {
        self.shared.as_ref()
    }

    /// Replace the identifier set used for shared listener retrieval.
    pub fn set_identifiers(&self, identifiers: Vec<String>) {
        *self.identifiers.write() = dedupe(identifiers);
    }

    /// Append to the identifier set, keeping it deduplicated.
    pub fn add_identifiers(&self, identifiers: Vec<String>) {
        let mut current = self.identifiers.write();
        let mut merged = std::mem::take(&mut *current);
        merged.extend(identifiers);
        *current = dedupe(merged);
    }

    pub fn identifiers(&self) -> Vec<String> {
        self.identifiers.read().clone()
    }

    fn attachment(&self) -> Result<&PrioritizedListenerProvider> {
        self.local.as_ref().ok_or(Error::NonAttachableProvider)
    }

    /// Attach `listener` to `event` at `priority`; returns the handle for a
    /// later detach.
    pub fn attach(&self, event: &str, listener: Listener, priority: i32) -> Result<Listener> {
        self.attachment()?.attach(event, listener, priority)
    }

    /// Attach `listener` to every event triggered through this engine.
    pub fn attach_wildcard(&self, listener: Listener, priority: i32) -> Result<Listener> {
        self.attachment()?.attach_wildcard(listener, priority)
    }

    /// Detach from one event bucket, or from all of them when `event` is
    /// `None`.
    pub fn detach(&self, listener: &Listener, event: Option<&str>) -> Result<()> {
        self.attachment()?.detach(listener, event);
        Ok(())
    }

    /// Detach from the wildcard bucket only.
    pub fn detach_wildcard(&self, listener: &Listener) -> Result<()> {
        self.attachment()?.detach_wildcard(listener);
        Ok(())
    }

    /// Drop every local listener attached to `event`.
    pub fn clear_listeners(&self, event: &str) -> Result<()> {
        self.attachment()?.clear_listeners(event);
        Ok(())
    }

    /// Local attachment introspection; see
    /// [`PrioritizedListenerProvider::events`].
    pub fn local_provider(&self) -> Option<&PrioritizedListenerProvider> {
        self.local.as_ref()
    }

    /// Build an event from the arguments and dispatch it.
    pub fn trigger(
        &self,
        event: &str,
        target: Option<EventTarget>,
        params: Params,
    ) -> Result<ResponseCollection> {
        let mut event = BasicEvent::new(event, target, params);
        self.trigger_listeners(&mut event, None)
    }

    /// Like [`trigger`](Self::trigger), but stops dispatch as soon as
    /// `predicate` returns true for a listener's response, regardless of the
    /// event's own propagation flag.
    pub fn trigger_until(
        &self,
        predicate: impl Fn(&Value) -> bool,
        event: &str,
        target: Option<EventTarget>,
        params: Params,
    ) -> Result<ResponseCollection> {
        let mut event = BasicEvent::new(event, target, params);
        self.trigger_listeners(&mut event, Some(&predicate))
    }

    /// Dispatch a caller-constructed event.
    pub fn trigger_event(&self, event: &mut dyn Event) -> Result<ResponseCollection> {
        self.trigger_listeners(event, None)
    }

    /// Dispatch a caller-constructed event with a short-circuit predicate.
    pub fn trigger_event_until(
        &self,
        predicate: impl Fn(&Value) -> bool,
        event: &mut dyn Event,
    ) -> Result<ResponseCollection> {
        self.trigger_listeners(event, Some(&predicate))
    }

    /// Generic-dispatcher entry point: runs the same loop as the trigger
    /// family but discards the response collection; the caller keeps the
    /// (possibly mutated) event.
    pub fn dispatch(&self, event: &mut dyn Event) -> Result<()> {
        self.trigger_listeners(event, None)?;
        Ok(())
    }

    /// The listeners `trigger_event` would invoke for `event`, in order.
    /// Introspection and testing aid.
    pub fn listeners_for_event(&self, event: &dyn Event) -> Result<Vec<Listener>> {
        let identifiers = self.identifiers.read().clone();
        self.provider.listeners_for_event(event, &identifiers)
    }

    fn trigger_listeners(
        &self,
        event: &mut dyn Event,
        predicate: Option<&dyn Fn(&Value) -> bool>,
    ) -> Result<ResponseCollection> {
        if event.name().is_empty() {
            return Err(Error::MissingEventName);
        }

        // A reused event instance may still carry a stale flag.
        event.stop_propagation(false);

        let identifiers = self.identifiers.read().clone();
        let listeners = self.provider.listeners_for_event(event, &identifiers)?;
        debug!(
            event = event.name(),
            listeners = listeners.len(),
            "triggering event"
        );

        let mut responses = ResponseCollection::new();
        for listener in listeners {
            let response = listener.invoke(event);
            // The event's own flag wins: a response that stopped propagation
            // is never offered to the predicate.
            let stopped = event.propagation_is_stopped();
            let matched = !stopped && predicate.is_some_and(|predicate| predicate(&response));
            responses.push(response);

            if stopped || matched {
                trace!(event = event.name(), responses = responses.len(), "propagation stopped");
                responses.set_stopped(true);
                return Ok(responses);
            }
        }

        Ok(responses)
    }
}

impl Default for EventManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ListenerAttachment for EventManager {
    fn attach(&self, event: &str, listener: Listener, priority: i32) -> Result<Listener> {
        EventManager::attach(self, event, listener, priority)
    }

    fn attach_wildcard(&self, listener: Listener, priority: i32) -> Result<Listener> {
        EventManager::attach_wildcard(self, listener, priority)
    }

    fn detach(&self, listener: &Listener, event: Option<&str>) -> Result<()> {
        EventManager::detach(self, listener, event)
    }

    fn detach_wildcard(&self, listener: &Listener) -> Result<()> {
        EventManager::detach_wildcard(self, listener)
    }

    fn clear_listeners(&self, event: &str) -> Result<()> {
        EventManager::clear_listeners(self, event)
    }
}

/// Deduplicate preserving first occurrence, the contract for identifier sets.
fn dedupe(identifiers: Vec<String>) -> Vec<String> {
    let mut deduped: Vec<String> = Vec::with_capacity(identifiers.len());
    for identifier in identifiers {
        if !deduped.contains(&identifier) {
            deduped.push(identifier);
        }
    }
    deduped
}

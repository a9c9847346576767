//! Prioritized listener provider
//!
//! The per-event-name listener store, and the provider answering queries
//! against it. Storage is a bucket-of-buckets: event name to priority to
//! attachment-ordered listener list. Buckets are kept sorted by the map
//! itself, so a trigger never re-sorts; it only walks priorities from
//! highest to lowest.

use crate::error::{Error, Result};
use crate::event::Event;
use crate::listener::{Listener, ListenerAttachment};
use crate::provider::{
    flatten_by_priority, merge_by_priority, ListenerProvider, PrioritizedListeners,
    PrioritizedProvider,
};
use crate::WILDCARD;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

type EventBuckets = HashMap<String, PrioritizedListeners>;

/// Listener registry keyed by event name, with priority-ordered buckets and a
/// reserved `"*"` name matching every event.
///
/// The provider is a cheap clone-able handle; clones share the same registry.
#[derive(Clone, Default)]
pub struct PrioritizedListenerProvider {
    events: Arc<RwLock<EventBuckets>>,
}

impl PrioritizedListenerProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `listener` to `event` at `priority`; returns the same handle so
    /// callers can keep it for a later detach.
    pub fn attach(&self, event: &str, listener: Listener, priority: i32) -> Result<Listener> {
        if event.is_empty() {
            return Err(Error::EmptyEventName);
        }

        self.events
            .write()
            .entry(event.to_string())
            .or_default()
            .entry(priority)
            .or_default()
            .push(listener.clone());

        debug!(event, priority, "listener attached");
        Ok(listener)
    }

    /// Attach `listener` to every event; equivalent to attaching to `"*"`.
    pub fn attach_wildcard(&self, listener: Listener, priority: i32) -> Result<Listener> {
        self.attach(WILDCARD, listener, priority)
    }

    /// Detach `listener` from one event bucket, or from every bucket
    /// (wildcard included) when `event` is `None`. Not finding the listener
    /// is a no-op, not an error.
    pub fn detach(&self, listener: &Listener, event: Option<&str>) {
        let mut events = self.events.write();
        match event {
            Some(event) => detach_from(&mut events, event, listener),
            None => {
                let names: Vec<String> = events.keys().cloned().collect();
                for name in names {
                    detach_from(&mut events, &name, listener);
                }
            }
        }
    }

    /// Detach `listener` from the wildcard bucket only, leaving any
    /// explicit-name attachments in place.
    pub fn detach_wildcard(&self, listener: &Listener) {
        self.detach(listener, Some(WILDCARD));
    }

    /// Drop every listener attached to `event`.
    pub fn clear_listeners(&self, event: &str) {
        if self.events.write().remove(event).is_some() {
            debug!(event, "listeners cleared");
        }
    }

    /// Names with at least one listener attached, sorted. Pruning on detach
    /// guarantees no empty entries show up here.
    pub fn events(&self) -> Vec<String> {
        let mut names: Vec<String> = self.events.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Total listeners attached under `event`, across all priorities.
    pub fn count(&self, event: &str) -> usize {
        self.events
            .read()
            .get(event)
            .map(|buckets| buckets.values().map(Vec::len).sum())
            .unwrap_or(0)
    }
}

/// Remove `listener` from one event entry, pruning emptied buckets and the
/// entry itself.
fn detach_from(events: &mut EventBuckets, event: &str, listener: &Listener) {
    let Some(buckets) = events.get_mut(event) else {
        return;
    };

    buckets.retain(|priority, listeners| {
        let before = listeners.len();
        listeners.retain(|candidate| candidate != listener);
        if listeners.len() != before {
            trace!(event, priority, "listener detached");
        }
        !listeners.is_empty()
    });

    if buckets.is_empty() {
        events.remove(event);
    }
}

impl PrioritizedProvider for PrioritizedListenerProvider {
    /// Group the applicable listeners by priority. Within one priority,
    /// explicit-name attachments precede tag attachments, which precede
    /// wildcard attachments; attachment order is preserved within a source.
    fn listeners_by_priority(
        &self,
        event: &dyn Event,
        _identifiers: &[String],
    ) -> Result<PrioritizedListeners> {
        let mut candidates: Vec<String> = Vec::with_capacity(2);
        if !event.name().is_empty() {
            candidates.push(event.name().to_string());
        }
        candidates.extend(event.tags());
        candidates.push(WILDCARD.to_string());

        let events = self.events.read();
        let mut prioritized = PrioritizedListeners::new();
        for name in candidates {
            if let Some(buckets) = events.get(&name) {
                merge_by_priority(&mut prioritized, buckets.clone());
            }
        }
        Ok(prioritized)
    }
}

impl ListenerProvider for PrioritizedListenerProvider {
    fn listeners_for_event(
        &self,
        event: &dyn Event,
        identifiers: &[String],
    ) -> Result<Vec<Listener>> {
        Ok(flatten_by_priority(
            self.listeners_by_priority(event, identifiers)?,
        ))
    }
}

impl ListenerAttachment for PrioritizedListenerProvider {
    fn attach(&self, event: &str, listener: Listener, priority: i32) -> Result<Listener> {
        PrioritizedListenerProvider::attach(self, event, listener, priority)
    }

    fn attach_wildcard(&self, listener: Listener, priority: i32) -> Result<Listener> {
        PrioritizedListenerProvider::attach_wildcard(self, listener, priority)
    }

    fn detach(&self, listener: &Listener, event: Option<&str>) -> Result<()> {
        PrioritizedListenerProvider::detach(self, listener, event);
        Ok(())
    }

    fn detach_wildcard(&self, listener: &Listener) -> Result<()> {
        PrioritizedListenerProvider::detach_wildcard(self, listener);
        Ok(())
    }

    fn clear_listeners(&self, event: &str) -> Result<()> {
        PrioritizedListenerProvider::clear_listeners(self, event);
        Ok(())
    }
}

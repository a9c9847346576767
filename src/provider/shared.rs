//! Shared listener provider
//!
//! A secondary registry keyed by identifier as well as event name. An
//! identifier is an opaque tag (commonly a component or type name) that lets
//! code attach listeners to "any engine of this kind" without holding a
//! reference to one. Engines consult this registry with their configured
//! identifier list at trigger time.
//!
//! Wildcards are legal on both axes at attachment time: the `"*"` identifier
//! matches every engine, and the `"*"` event name matches every event. A
//! trigger, by contrast, must name a concrete event.

use crate::error::{Error, Result};
use crate::event::Event;
use crate::listener::Listener;
use crate::provider::{
    flatten_by_priority, merge_by_priority, ListenerProvider, PrioritizedListeners,
    PrioritizedProvider,
};
use crate::WILDCARD;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

type IdentifierBuckets = HashMap<String, HashMap<String, PrioritizedListeners>>;

/// Identifier-keyed listener registry, shared between engines.
///
/// Clone-able handle; clones refer to the same registry, which is how one
/// shared registry serves many [`EventManager`] instances.
///
/// [`EventManager`]: crate::manager::EventManager
#[derive(Clone, Default)]
pub struct SharedListenerProvider {
    identifiers: Arc<RwLock<IdentifierBuckets>>,
}

impl SharedListenerProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `listener` under `(identifier, event)` at `priority`; either
    /// key may be the wildcard.
    pub fn attach(
        &self,
        identifier: &str,
        event: &str,
        listener: Listener,
        priority: i32,
    ) -> Result<Listener> {
        if identifier.is_empty() {
            return Err(Error::EmptyIdentifier);
        }
        if event.is_empty() {
            return Err(Error::EmptyEventName);
        }

        self.identifiers
            .write()
            .entry(identifier.to_string())
            .or_default()
            .entry(event.to_string())
            .or_default()
            .entry(priority)
            .or_default()
            .push(listener.clone());

        debug!(identifier, event, priority, "shared listener attached");
        Ok(listener)
    }

    /// Detach `listener`, scoped by identifier and event name.
    ///
    /// A `None` or wildcard identifier detaches across every identifier; a
    /// `None` or wildcard event name detaches across every event of the
    /// selected identifier(s). Explicit empty strings are rejected.
    pub fn detach(
        &self,
        listener: &Listener,
        identifier: Option<&str>,
        event: Option<&str>,
    ) -> Result<()> {
        if let Some("") = identifier {
            return Err(Error::EmptyIdentifier);
        }
        if let Some("") = event {
            return Err(Error::EmptyEventName);
        }

        let mut identifiers = self.identifiers.write();
        let selected: Vec<String> = match identifier {
            Some(identifier) if identifier != WILDCARD => vec![identifier.to_string()],
            _ => identifiers.keys().cloned().collect(),
        };

        for identifier in selected {
            let Some(events) = identifiers.get_mut(&identifier) else {
                continue;
            };

            let names: Vec<String> = match event {
                Some(event) if event != WILDCARD => vec![event.to_string()],
                _ => events.keys().cloned().collect(),
            };

            for name in names {
                let Some(buckets) = events.get_mut(&name) else {
                    continue;
                };
                buckets.retain(|_, listeners| {
                    listeners.retain(|candidate| candidate != listener);
                    !listeners.is_empty()
                });
                if buckets.is_empty() {
                    events.remove(&name);
                }
            }

            if events.is_empty() {
                identifiers.remove(&identifier);
            }
        }

        Ok(())
    }

    /// Drop listeners for `identifier`, either one event's or all of them.
    pub fn clear_listeners(&self, identifier: &str, event: Option<&str>) {
        let mut identifiers = self.identifiers.write();
        match event {
            None => {
                identifiers.remove(identifier);
            }
            Some(event) => {
                if let Some(events) = identifiers.get_mut(identifier) {
                    events.remove(event);
                    if events.is_empty() {
                        identifiers.remove(identifier);
                    }
                }
            }
        }
    }

    /// Identifiers with at least one listener attached, sorted.
    pub fn identifiers(&self) -> Vec<String> {
        let mut names: Vec<String> = self.identifiers.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Total listeners attached under `(identifier, event)`.
    pub fn count(&self, identifier: &str, event: &str) -> usize {
        self.identifiers
            .read()
            .get(identifier)
            .and_then(|events| events.get(event))
            .map(|buckets| buckets.values().map(Vec::len).sum())
            .unwrap_or(0)
    }
}

/// Deduplicate while preserving caller order, forcing the wildcard
/// identifier to the end (appending it if absent).
fn normalize_identifiers(identifiers: &[String]) -> Result<Vec<String>> {
    let mut normalized: Vec<String> = Vec::with_capacity(identifiers.len() + 1);
    for identifier in identifiers {
        if identifier.is_empty() {
            return Err(Error::EmptyIdentifier);
        }
        if identifier != WILDCARD && !normalized.contains(identifier) {
            normalized.push(identifier.clone());
        }
    }
    normalized.push(WILDCARD.to_string());
    Ok(normalized)
}

impl PrioritizedProvider for SharedListenerProvider {
    fn listeners_by_priority(
        &self,
        event: &dyn Event,
        identifiers: &[String],
    ) -> Result<PrioritizedListeners> {
        if event.name().is_empty() {
            return Err(Error::EmptyEventName);
        }
        if event.name() == WILDCARD {
            return Err(Error::WildcardTrigger);
        }

        let mut names: Vec<String> = vec![event.name().to_string()];
        names.extend(event.tags());
        names.push(WILDCARD.to_string());

        let registry = self.identifiers.read();
        let mut prioritized = PrioritizedListeners::new();
        for identifier in normalize_identifiers(identifiers)? {
            let Some(events) = registry.get(&identifier) else {
                continue;
            };
            for name in &names {
                if let Some(buckets) = events.get(name) {
                    merge_by_priority(&mut prioritized, buckets.clone());
                }
            }
        }
        Ok(prioritized)
    }
}

impl ListenerProvider for SharedListenerProvider {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::BasicEvent;
    use serde_json::{json, Value};

    fn tagged(tag: &str) -> Listener {
        let tag = json!(tag);
        Listener::new(move |_| tag.clone())
    }

    fn order_for(
        provider: &SharedListenerProvider,
        event: &str,
        identifiers: &[&str],
    ) -> Vec<Value> {
        let identifiers: Vec<String> = identifiers.iter().map(|s| s.to_string()).collect();
        let event = BasicEvent::named(event);
        let listeners = provider.listeners_for_event(&event, &identifiers).unwrap();
        let mut probe = BasicEvent::named("probe");
        listeners
            .iter()
            .map(|listener| listener.invoke(&mut probe))
            .collect()
    }

    #[test]
    fn test_attach_validation() {
        let provider = SharedListenerProvider::new();
        assert_eq!(
            provider.attach("", "foo", tagged("x"), 1).unwrap_err(),
            Error::EmptyIdentifier
        );
        assert_eq!(
            provider.attach("Component", "", tagged("x"), 1).unwrap_err(),
            Error::EmptyEventName
        );
    }

    #[test]
    fn test_identifier_and_name_match() {
        let provider = SharedListenerProvider::new();
        provider.attach("Component", "foo", tagged("exact"), 1).unwrap();
        provider.attach("Component", "bar", tagged("other-event"), 1).unwrap();
        provider.attach("Other", "foo", tagged("other-identifier"), 1).unwrap();

        assert_eq!(order_for(&provider, "foo", &["Component"]), vec![json!("exact")]);
    }

    #[test]
    fn test_wildcard_on_both_axes() {
        let provider = SharedListenerProvider::new();
        provider.attach("Component", "foo", tagged("exact"), 1).unwrap();
        provider.attach("Component", WILDCARD, tagged("any-event"), 1).unwrap();
        provider.attach(WILDCARD, "foo", tagged("any-identifier"), 1).unwrap();
        provider.attach(WILDCARD, WILDCARD, tagged("everything"), 1).unwrap();

        assert_eq!(
            order_for(&provider, "foo", &["Component"]),
            vec![
                json!("exact"),
                json!("any-event"),
                json!("any-identifier"),
                json!("everything")
            ]
        );
    }

    #[test]
    fn test_identifier_order_then_wildcard_last() {
        let provider = SharedListenerProvider::new();
        provider.attach(WILDCARD, "foo", tagged("wild"), 1).unwrap();
        provider.attach("B", "foo", tagged("b"), 1).unwrap();
        provider.attach("A", "foo", tagged("a"), 1).unwrap();

        // Caller order decides; wildcard identifier always trails, even when
        // supplied explicitly mid-list.
        assert_eq!(
            order_for(&provider, "foo", &["B", "*", "A", "B"]),
            vec![json!("b"), json!("a"), json!("wild")]
        );
    }

    #[test]
    fn test_priority_overrides_identifier_order() {
        let provider = SharedListenerProvider::new();
        provider.attach("A", "foo", tagged("a-low"), 1).unwrap();
        provider.attach("B", "foo", tagged("b-high"), 5).unwrap();

        assert_eq!(
            order_for(&provider, "foo", &["A", "B"]),
            vec![json!("b-high"), json!("a-low")]
        );
    }

    #[test]
    fn test_empty_identifier_rejected_on_retrieval() {
        let provider = SharedListenerProvider::new();
        let event = BasicEvent::named("foo");
        let err = provider
            .listeners_for_event(&event, &["".to_string()])
            .unwrap_err();
        assert_eq!(err, Error::EmptyIdentifier);
    }

    #[test]
    fn test_wildcard_is_not_a_trigger_target() {
        let provider = SharedListenerProvider::new();

        let unnamed = BasicEvent::named("");
        assert_eq!(
            provider.listeners_for_event(&unnamed, &[]).unwrap_err(),
            Error::EmptyEventName
        );

        let wildcard = BasicEvent::named(WILDCARD);
        assert_eq!(
            provider.listeners_for_event(&wildcard, &[]).unwrap_err(),
            Error::WildcardTrigger
        );
    }

    #[test]
    fn test_detach_explicit_pair() {
        let provider = SharedListenerProvider::new();
        let listener = tagged("x");
        provider.attach("A", "foo", listener.clone(), 1).unwrap();
        provider.attach("A", "bar", listener.clone(), 1).unwrap();
        provider.attach("B", "foo", listener.clone(), 1).unwrap();

        provider.detach(&listener, Some("A"), Some("foo")).unwrap();

        assert_eq!(provider.count("A", "foo"), 0);
        assert_eq!(provider.count("A", "bar"), 1);
        assert_eq!(provider.count("B", "foo"), 1);
    }

    #[test]
    fn test_detach_across_all_identifiers() {
        let provider = SharedListenerProvider::new();
        let listener = tagged("x");
        provider.attach("A", "foo", listener.clone(), 1).unwrap();
        provider.attach("B", "foo", listener.clone(), 2).unwrap();
        provider.attach(WILDCARD, "foo", listener.clone(), 1).unwrap();

        provider.detach(&listener, None, None).unwrap();

        assert!(provider.identifiers().is_empty());
    }

    #[test]
    fn test_detach_prunes_empty_entries() {
        let provider = SharedListenerProvider::new();
        let gone = tagged("gone");
        let kept = tagged("kept");
        provider.attach("A", "foo", gone.clone(), 1).unwrap();
        provider.attach("A", "bar", kept, 1).unwrap();

        provider.detach(&gone, Some("A"), Some("foo")).unwrap();

        assert_eq!(provider.identifiers(), vec!["A".to_string()]);
        assert_eq!(provider.count("A", "foo"), 0);
        assert_eq!(provider.count("A", "bar"), 1);
    }

    #[test]
    fn test_clear_listeners_scopes() {
        let provider = SharedListenerProvider::new();
        provider.attach("A", "foo", tagged("1"), 1).unwrap();
        provider.attach("A", "bar", tagged("2"), 1).unwrap();
        provider.attach("B", "foo", tagged("3"), 1).unwrap();

        provider.clear_listeners("A", Some("foo"));
        assert_eq!(provider.count("A", "bar"), 1);

        provider.clear_listeners("A", None);
        assert_eq!(provider.identifiers(), vec!["B".to_string()]);
    }
}

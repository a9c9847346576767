//! Aggregate listener provider
//!
//! Merges the priority-grouped results of several providers into one ordered
//! iteration. Construction order is precedence: at equal priority, listeners
//! from an earlier provider run before listeners from a later one, which is
//! how an engine's locally attached listeners stay ahead of shared ones.

use crate::error::Result;
use crate::event::Event;
use crate::listener::Listener;
use crate::provider::{
    flatten_by_priority, merge_by_priority, ListenerProvider, PrioritizedListeners,
    PrioritizedProvider,
};
use std::sync::Arc;

/// Composition of prioritized providers, with an optional non-prioritized
/// fallback whose listeners trail the whole prioritized sequence.
#[derive(Clone)]
pub struct AggregateListenerProvider {
    providers: Vec<Arc<dyn PrioritizedProvider>>,
    default_provider: Option<Arc<dyn ListenerProvider>>,
}

impl AggregateListenerProvider {
    pub fn new(providers: Vec<Arc<dyn PrioritizedProvider>>) -> Self {
        Self {
            providers,
            default_provider: None,
        }
    }

    /// Compose with a fallback provider that cannot report priorities; its
    /// listeners are appended after every prioritized listener.
    pub fn with_default(
        providers: Vec<Arc<dyn PrioritizedProvider>>,
        default_provider: Arc<dyn ListenerProvider>,
    ) -> Self {
        Self {
            providers,
            default_provider: Some(default_provider),
        }
    }
}

impl PrioritizedProvider for AggregateListenerProvider {
    fn listeners_by_priority(
        &self,
        event: &dyn Event,
        identifiers: &[String],
    ) -> Result<PrioritizedListeners> {
        let mut prioritized = PrioritizedListeners::new();
        for provider in &self.providers {
            merge_by_priority(
                &mut prioritized,
                provider.listeners_by_priority(event, identifiers)?,
            );
        }
        Ok(prioritized)
    }
}

impl ListenerProvider for AggregateListenerProvider {
    fn listeners_for_event(
        &self,
        event: &dyn Event,
        identifiers: &[String],
    ) -> Result<Vec<Listener>> {
        let mut listeners =
            flatten_by_priority(self.listeners_by_priority(event, identifiers)?);
        if let Some(default_provider) = &self.default_provider {
            listeners.extend(default_provider.listeners_for_event(event, identifiers)?);
        }
        Ok(listeners)
    }
}

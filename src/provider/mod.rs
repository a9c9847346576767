//! Listener providers
//!
//! A provider answers one question: given an event (and the identifiers of
//! the asking engine), which listeners apply, and in what order? The
//! [`PrioritizedProvider`] refinement additionally exposes the per-priority
//! grouping, which is what lets [`AggregateListenerProvider`] merge several
//! providers into a single deterministic iteration.

use crate::error::Result;
use crate::event::Event;
use crate::listener::Listener;
use std::collections::BTreeMap;

pub mod aggregate;
pub mod lazy;
pub mod prioritized;
pub mod shared;

pub use aggregate::AggregateListenerProvider;
pub use lazy::{LazyListener, LazyListenerSubscriber, ListenerResolver};
pub use prioritized::PrioritizedListenerProvider;
pub use shared::SharedListenerProvider;

/// Listeners grouped by priority. Iterated highest-first at flatten time.
pub type PrioritizedListeners = BTreeMap<i32, Vec<Listener>>;

/// Supplies the listeners applicable to an event, already ordered.
pub trait ListenerProvider: Send + Sync {
    /// All applicable listeners, in invocation order.
    ///
    /// `identifiers` are consulted only by identifier-aware providers; the
    /// local prioritized provider ignores them.
    fn listeners_for_event(
        &self,
        event: &dyn Event,
        identifiers: &[String],
    ) -> Result<Vec<Listener>>;
}

/// Providers able to report listeners grouped by priority.
///
/// Required for composition: merging two providers fairly needs the
/// per-priority view, not the flattened one.
pub trait PrioritizedProvider: ListenerProvider {
    fn listeners_by_priority(
        &self,
        event: &dyn Event,
        identifiers: &[String],
    ) -> Result<PrioritizedListeners>;
}

/// Flatten a priority grouping into invocation order: strictly descending
/// priority, attachment order within one priority.
pub(crate) fn flatten_by_priority(prioritized: PrioritizedListeners) -> Vec<Listener> {
    prioritized
        .into_iter()
        .rev()
        .flat_map(|(_, listeners)| listeners)
        .collect()
}

/// Merge one priority grouping into an accumulator, preserving the
/// accumulator's entries ahead of the incoming ones at equal priority.
pub(crate) fn merge_by_priority(
    accumulated: &mut PrioritizedListeners,
    incoming: PrioritizedListeners,
) {
    for (priority, listeners) in incoming {
        accumulated.entry(priority).or_default().extend(listeners);
    }
}

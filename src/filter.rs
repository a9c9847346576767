//! Intercepting filter chain
//!
//! A simpler cousin of event dispatch: filters form a priority-ordered
//! pipeline over a shared parameter set, and each filter decides whether the
//! rest of the chain runs by calling (or not calling) onward. Useful when a
//! component wants its inputs or outputs transformable by foreign code
//! without the full event machinery.

use crate::event::Params;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// One stage of a filter chain.
///
/// Identity-comparable handle, like [`Listener`](crate::listener::Listener):
/// keep the handle returned by [`FilterChain::attach`] to detach later.
#[derive(Clone)]
pub struct Filter(Arc<dyn Fn(&mut Params, &mut FilterIter) -> Value + Send + Sync>);

impl Filter {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&mut Params, &mut FilterIter) -> Value + Send + Sync + 'static,
    {
        Self(Arc::new(callback))
    }
}

impl PartialEq for Filter {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Filter {}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Filter({:p})", Arc::as_ptr(&self.0))
    }
}

/// The remainder of a running chain, handed to each filter.
pub struct FilterIter {
    remaining: std::vec::IntoIter<Filter>,
}

impl FilterIter {
    /// Run the next filter, or return `Null` when the chain is exhausted.
    /// A filter that never calls this short-circuits the rest of the chain.
    pub fn next_filter(&mut self, params: &mut Params) -> Value {
        match self.remaining.next() {
            Some(filter) => (filter.0)(params, self),
            None => Value::Null,
        }
    }
}

/// Priority-ordered intercepting pipeline.
///
/// Same ordering rules as listener dispatch: higher priority runs earlier,
/// attachment order within one priority.
#[derive(Clone, Default)]
pub struct FilterChain {
    filters: Arc<RwLock<PrioritizedFilters>>,
}

type PrioritizedFilters = BTreeMap<i32, Vec<Filter>>;

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a filter at `priority`; returns the same handle.
    pub fn attach(&self, filter: Filter, priority: i32) -> Filter {
        self.filters
            .write()
            .entry(priority)
            .or_default()
            .push(filter.clone());
        filter
    }

    /// Remove a filter by identity; returns whether anything was removed.
    pub fn detach(&self, filter: &Filter) -> bool {
        let mut filters = self.filters.write();
        let before: usize = filters.values().map(Vec::len).sum();
        filters.retain(|_, bucket| {
            bucket.retain(|candidate| candidate != filter);
            !bucket.is_empty()
        });
        let after: usize = filters.values().map(Vec::len).sum();
        after != before
    }

    pub fn len(&self) -> usize {
        self.filters.read().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.read().is_empty()
    }

    /// Run the chain over `params`; the return value is whatever the first
    /// filter returns (conventionally the value threaded back up the chain).
    pub fn run(&self, params: &mut Params) -> Value {
        let snapshot: Vec<Filter> = self
            .filters
            .read()
            .iter()
            .rev()
            .flat_map(|(_, bucket)| bucket.iter().cloned())
            .collect();

        let mut iter = FilterIter {
            remaining: snapshot.into_iter(),
        };
        iter.next_filter(params)
    }
}

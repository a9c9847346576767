//! Lazy listener resolution
//!
//! Defers listener construction to first invocation: the registry holds only
//! a service key, and a [`ListenerResolver`] (typically backed by a DI
//! container) turns that key into a real listener when an event actually
//! arrives. The resolved listener is cached for the lifetime of the lazy
//! handle.

use crate::error::{Error, Result};
use crate::event::Event;
use crate::listener::{Listener, ListenerAttachment, ListenerSubscriber};
use once_cell::sync::OnceCell;
use serde_json::Value;
use std::sync::Arc;
use tracing::error;

/// Resolves an opaque service key to a listener on demand.
///
/// This is the only seam the dispatch core needs from a container: when and
/// how the service is built is the resolver's concern.
pub trait ListenerResolver: Send + Sync {
    fn resolve(&self, service: &str) -> Result<Listener>;
}

struct LazyState {
    resolver: Arc<dyn ListenerResolver>,
    service: String,
    resolved: OnceCell<Listener>,
}

impl LazyState {
    fn invoke(&self, event: &mut dyn Event) -> Value {
        let resolved = self
            .resolved
            .get_or_try_init(|| self.resolver.resolve(&self.service));
        match resolved {
            Ok(listener) => listener.invoke(event),
            Err(err) => {
                error!(service = %self.service, %err, "lazy listener resolution failed");
                Value::Null
            }
        }
    }
}

/// A listener resolved through a [`ListenerResolver`] on first invocation.
///
/// The optional event name and priority exist for subscriber-style bulk
/// attachment; a bare lazy listener can be attached anywhere a [`Listener`]
/// can.
pub struct LazyListener {
    state: Arc<LazyState>,
    event: Option<String>,
    priority: Option<i32>,
    handle: OnceCell<Listener>,
}

impl LazyListener {
    /// Requires a non-empty service key.
    pub fn new(resolver: Arc<dyn ListenerResolver>, service: impl Into<String>) -> Result<Self> {
        let service = service.into();
        if service.is_empty() {
            return Err(Error::EmptyServiceName);
        }
        Ok(Self {
            state: Arc::new(LazyState {
                resolver,
                service,
                resolved: OnceCell::new(),
            }),
            event: None,
            priority: None,
            handle: OnceCell::new(),
        })
    }

    /// Event this listener should be attached to by a subscriber.
    pub fn for_event(mut self, event: impl Into<String>) -> Result<Self> {
        let event = event.into();
        if event.is_empty() {
            return Err(Error::EmptyEventName);
        }
        self.event = Some(event);
        Ok(self)
    }

    /// Priority a subscriber should attach this listener at.
    pub fn at_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn event(&self) -> Option<&str> {
        self.event.as_deref()
    }

    /// The configured priority, or `default` when none was set.
    pub fn priority(&self, default: i32) -> i32 {
        self.priority.unwrap_or(default)
    }

    /// The attachable handle. Stable across calls, so the same handle used
    /// for attach can be passed back for detach.
    pub fn listener(&self) -> Listener {
        self.handle
            .get_or_init(|| {
                let state = self.state.clone();
                Listener::new(move |event| state.invoke(event))
            })
            .clone()
    }
}

impl std::fmt::Debug for LazyListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyListener")
            .field("service", &self.state.service)
            .field("event", &self.event)
            .field("priority", &self.priority)
            .finish()
    }
}

/// A bundle of lazy listeners attached and detached as a unit.
///
/// Every composed lazy listener must name its event; priorities default to
/// the one supplied at attach time.
pub struct LazyListenerSubscriber {
    listeners: Vec<LazyListener>,
}

impl LazyListenerSubscriber {
    pub fn new(listeners: Vec<LazyListener>) -> Result<Self> {
        if listeners.iter().any(|lazy| lazy.event.is_none()) {
            return Err(Error::EmptyEventName);
        }
        Ok(Self { listeners })
    }
}

impl std::fmt::Debug for LazyListenerSubscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyListenerSubscriber")
            .field("listeners", &self.listeners)
            .finish()
    }
}

impl ListenerSubscriber for LazyListenerSubscriber {
    fn attach(&self, target: &dyn ListenerAttachment, priority: i32) -> Result<()> {
        for lazy in &self.listeners {
            // Validated non-empty at construction.
            let event = lazy.event.as_deref().unwrap_or_default();
            target.attach(event, lazy.listener(), lazy.priority(priority))?;
        }
        Ok(())
    }

    fn detach(&self, target: &dyn ListenerAttachment) -> Result<()> {
        for lazy in &self.listeners {
            target.detach(&lazy.listener(), None)?;
        }
        Ok(())
    }
}

//! Listener handles and attachment traits

use crate::error::Result;
use crate::event::Event;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Priority listeners are attached at when none is given explicitly.
/// Higher priorities respond earlier; negative priorities respond later.
pub const DEFAULT_PRIORITY: i32 = 1;

/// An attachable listener callback.
///
/// `Listener` is a cheap clone-able handle; every clone refers to the same
/// underlying callable, and equality is identity of that callable. Detaching
/// relies on this: retain the handle returned by `attach` and pass it back.
#[derive(Clone)]
pub struct Listener(Arc<dyn Fn(&mut dyn Event) -> Value + Send + Sync>);

impl Listener {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&mut dyn Event) -> Value + Send + Sync + 'static,
    {
        Self(Arc::new(callback))
    }

    /// Invoke the listener with an event, returning its response value.
    pub fn invoke(&self, event: &mut dyn Event) -> Value {
        (self.0)(event)
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Listener {}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({:p})", Arc::as_ptr(&self.0))
    }
}

/// The attach/detach surface shared by listener registries.
///
/// Implemented by [`PrioritizedListenerProvider`] and, by delegation, by
/// [`EventManager`]; subscribers are written against this trait so they can
/// register with either.
///
/// [`PrioritizedListenerProvider`]: crate::provider::PrioritizedListenerProvider
/// [`EventManager`]: crate::manager::EventManager
pub trait ListenerAttachment: Send + Sync {
    /// Attach `listener` to `event` at `priority`; returns the same handle.
    fn attach(&self, event: &str, listener: Listener, priority: i32) -> Result<Listener>;

    /// Attach `listener` to every event, regardless of name.
    fn attach_wildcard(&self, listener: Listener, priority: i32) -> Result<Listener>;

    /// Detach `listener` from one event bucket, or from all of them when
    /// `event` is `None`. Unknown listeners are a no-op.
    fn detach(&self, listener: &Listener, event: Option<&str>) -> Result<()>;

    /// Detach `listener` from the wildcard bucket only.
    fn detach_wildcard(&self, listener: &Listener) -> Result<()>;

    /// Drop every listener attached to `event`.
    fn clear_listeners(&self, event: &str) -> Result<()>;
}

/// A bundle of listeners that registers and unregisters itself as a unit.
pub trait ListenerSubscriber: Send + Sync {
    /// Attach the bundle's listeners, using `priority` as the default for
    /// listeners without an opinion of their own.
    fn attach(&self, target: &dyn ListenerAttachment, priority: i32) -> Result<()>;

    /// Detach everything this bundle previously attached to `target`.
    fn detach(&self, target: &dyn ListenerAttachment) -> Result<()>;
}

//! Event definitions and traits
//!
//! An event is the value passed to every listener during a dispatch. The
//! [`Event`] trait is the minimal surface the dispatch loop needs; the
//! [`BasicEvent`] value is what [`EventManager::trigger`] builds for you.
//! Custom event types implement [`Event`] directly and are dispatched with
//! [`EventManager::trigger_event`]; listeners recover the concrete type
//! through [`Event::as_any`].
//!
//! [`EventManager::trigger`]: crate::manager::EventManager::trigger
//! [`EventManager::trigger_event`]: crate::manager::EventManager::trigger_event

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Event trait
///
/// The dispatch loop only needs a name, the propagation flag, and downcast
/// access. `tags` lets an event expose additional attachment names (for
/// example a concrete event-kind tag) that listeners may have attached to
/// instead of the plain event name.
pub trait Event: Send + Sync {
    /// Name under which listeners were attached.
    fn name(&self) -> &str;

    /// Additional attachment names this event also matches, in match order.
    fn tags(&self) -> Vec<String> {
        Vec::new()
    }

    /// Set or clear the stop-propagation flag.
    fn stop_propagation(&mut self, flag: bool);

    /// Whether a listener asked to halt the current dispatch.
    fn propagation_is_stopped(&self) -> bool;

    /// Cast to `Any` for downcasting in listeners.
    fn as_any(&self) -> &dyn Any;

    /// Mutable cast to `Any` for downcasting in listeners.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// The owner/context of an event, purely informational to listeners.
#[derive(Clone)]
pub enum EventTarget {
    /// A symbolic target, e.g. the name of the triggering component.
    Name(String),
    /// A live object reference.
    Object(Arc<dyn Any + Send + Sync>),
}

impl EventTarget {
    /// The symbolic name, if this target is one.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            EventTarget::Name(name) => Some(name),
            EventTarget::Object(_) => None,
        }
    }

    /// Downcast an object target to a concrete type.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        match self {
            EventTarget::Name(_) => None,
            EventTarget::Object(object) => object.downcast_ref(),
        }
    }
}

impl fmt::Debug for EventTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventTarget::Name(name) => f.debug_tuple("Name").field(name).finish(),
            EventTarget::Object(_) => f.write_str("Object(..)"),
        }
    }
}

impl From<&str> for EventTarget {
    fn from(name: &str) -> Self {
        EventTarget::Name(name.to_string())
    }
}

impl From<String> for EventTarget {
    fn from(name: String) -> Self {
        EventTarget::Name(name)
    }
}

/// Event parameters: a string-keyed map of arbitrary JSON values.
///
/// Params are carried on the event itself and are not copied per listener;
/// a listener that rewrites a value is observed by every later listener in
/// the same dispatch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(serde_json::Map<String, Value>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion, for trigger call sites.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Fetch a parameter, falling back to `default` when absent.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a Value) -> &'a Value {
        self.0.get(key).unwrap_or(default)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl From<serde_json::Map<String, Value>> for Params {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// General-purpose event value
///
/// Encapsulates a name, an optional target context, and mutable parameters.
/// This is the event type built by the trigger family; pre-building one and
/// dispatching it with `trigger_event` is equally valid.
#[derive(Debug, Clone, Default)]
pub struct BasicEvent {
    name: String,
    target: Option<EventTarget>,
    params: Params,
    stopped: bool,
}

impl BasicEvent {
    pub fn new(
        name: impl Into<String>,
        target: Option<EventTarget>,
        params: Params,
    ) -> Self {
        Self {
            name: name.into(),
            target,
            params,
            stopped: false,
        }
    }

    /// An event carrying only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, None, Params::new())
    }

    /// Rename the event; legal any time before dispatch.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn target(&self) -> Option<&EventTarget> {
        self.target.as_ref()
    }

    pub fn set_target(&mut self, target: Option<EventTarget>) {
        self.target = target;
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut Params {
        &mut self.params
    }

    /// Replace the whole parameter set.
    pub fn set_params(&mut self, params: Params) {
        self.params = params;
    }

    /// Fetch one parameter, `None` when absent.
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    /// Set one parameter in place.
    pub fn set_param(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.params.set(key, value);
    }
}

impl Event for BasicEvent {
    fn name(&self) -> &str {
        &self.name
    }

    fn stop_propagation(&mut self, flag: bool) {
        self.stopped = flag;
    }

    fn propagation_is_stopped(&self) -> bool {
        self.stopped
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

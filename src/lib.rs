//! Prioritized, synchronous in-process event management
//!
//! Components register listeners against named events and other components
//! trigger those events by name; registered listeners execute synchronously
//! in a deterministic order. This underpins plugin and extension points:
//! modules emit domain events, and foreign code observes or short-circuits
//! behavior without compile-time coupling.
//!
//! ## Features
//!
//! - **Priorities** - Higher-priority listeners run first, attachment order
//!   breaks ties
//! - **Wildcards** - Listen to every event with a single attachment
//! - **Shared listeners** - Attach to "any engine of a given kind" through
//!   identifier-keyed registries
//! - **Stop propagation** - Listeners (or a caller predicate) halt dispatch
//!   early
//! - **Lazy listeners** - Defer listener construction to first invocation
//!   through a resolver seam
//! - **Filter chains** - Priority-ordered intercepting pipelines over shared
//!   parameters
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use herald::{EventManager, Listener, Params};
//! use serde_json::json;
//!
//! let events = EventManager::new();
//!
//! // Attach at priority 1; higher priorities respond earlier.
//! let handle = events.attach("user.created", Listener::new(|event| {
//!     json!("welcome-mail-queued")
//! }), 1)?;
//!
//! let responses = events.trigger(
//!     "user.created",
//!     None,
//!     Params::new().with("email", "alice@example.com"),
//! )?;
//! assert_eq!(responses.last(), Some(&json!("welcome-mail-queued")));
//!
//! // Detach by passing the handle back.
//! events.detach(&handle, Some("user.created"))?;
//! ```
//!
//! ## Stopping propagation
//!
//! ```rust,ignore
//! events.attach("auth.check", Listener::new(|event| {
//!     event.stop_propagation(true);   // no later listener runs
//!     json!("denied")
//! }), 100)?;
//!
//! let responses = events.trigger("auth.check", None, Params::new())?;
//! assert!(responses.stopped());
//! ```
//!
//! Dispatch is always synchronous, single-threaded, and call-stack-bound:
//! there is no deferred execution and no listener fault isolation. A
//! panicking listener unwinds out of `trigger` and aborts the remainder of
//! that dispatch.

pub mod error;
pub mod event;
pub mod filter;
pub mod global;
pub mod listener;
pub mod manager;
pub mod provider;
pub mod responses;

/// Reserved event name and identifier matching everything in its dimension.
/// Valid as an attachment target only, never as a trigger target.
pub const WILDCARD: &str = "*";

pub use error::{Error, Result};
pub use event::{BasicEvent, Event, EventTarget, Params};
pub use filter::{Filter, FilterChain, FilterIter};
pub use listener::{Listener, ListenerAttachment, ListenerSubscriber, DEFAULT_PRIORITY};
pub use manager::EventManager;
pub use provider::{
    AggregateListenerProvider, LazyListener, LazyListenerSubscriber, ListenerProvider,
    ListenerResolver, PrioritizedListenerProvider, PrioritizedProvider, SharedListenerProvider,
};
pub use responses::ResponseCollection;

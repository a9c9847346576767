//! Process-wide default event manager
//!
//! Some applications want one well-known engine that late-bound code can
//! reach without threading a handle through every layer. This module keeps
//! that explicit: application startup code builds an [`EventManager`],
//! installs it exactly once, and everything else asks for it. There is no
//! implicit construction; before [`init`] runs, [`instance`] returns `None`.

use crate::error::{Error, Result};
use crate::manager::EventManager;
use once_cell::sync::OnceCell;

static GLOBAL: OnceCell<EventManager> = OnceCell::new();

/// Install the process-wide default manager. Fails on the second call.
pub fn init(manager: EventManager) -> Result<()> {
    GLOBAL
        .set(manager)
        .map_err(|_| Error::GlobalAlreadyInitialized)
}

/// A handle to the installed manager, if any. Handles are cheap clones
/// sharing the installed registries.
pub fn instance() -> Option<EventManager> {
    GLOBAL.get().cloned()
}

// Error types for the herald event manager

use thiserror::Error;

/// Convenience result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("event name must be a non-empty string")]
    EmptyEventName,

    #[error("identifier must be a non-empty string")]
    EmptyIdentifier,

    #[error("the wildcard event name is only valid as an attachment target, not a trigger target")]
    WildcardTrigger,

    #[error("lazy listener requires a non-empty service name")]
    EmptyServiceName,

    #[error("event is missing a name; cannot trigger")]
    MissingEventName,

    #[error("the composed listener provider does not support attachment; attach listeners to the provider directly before composing it")]
    NonAttachableProvider,

    #[error("the global event manager has already been initialized")]
    GlobalAlreadyInitialized,

    #[error("unable to resolve lazy listener service: {0}")]
    ListenerResolution(String),
}

impl Error {
    /// True for malformed input rejected synchronously at the API boundary.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            Error::EmptyEventName
                | Error::EmptyIdentifier
                | Error::WildcardTrigger
                | Error::EmptyServiceName
        )
    }

    /// True for contractual misuse only discoverable at dispatch or setup time.
    pub fn is_runtime(&self) -> bool {
        !self.is_invalid_argument()
    }
}

use std::result::Result as StdResult;

use thiserror::Error;

/// Convenient result type for the engine crate.
pub type Result<T> = StdResult<T, Error>;

/// Errors surfaced by controller setup and management calls.
///
/// Key presses never produce these; misses and denials are absorbed and
/// reported through diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    /// The configured handler name is already published in the namespace.
    #[error("The {0} handler name is already published")]
    HandlerConflict(String),

    /// The configuration failed validation.
    #[error("Invalid configuration: {0}")]
    Config(#[from] config::Error),

    /// The key binder rejected a combo.
    #[error("Key binding error: {0}")]
    Bind(#[from] keybind::Error),

    /// The document rejected an observer registration.
    #[error("Document error: {0}")]
    Dom(#[from] domkey_dom::DomError),

    /// `observer` was called without an observer callback in the options.
    #[error("No observer callback configured")]
    NoObserverCallback,
}

//! Error types and result alias for the keybind crate.
use std::result::Result as StdResult;

use thiserror::Error;

/// Convenient result type used throughout this crate.
pub type Result<T> = StdResult<T, Error>;

/// Error variants produced by this crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A combo in a bind call could not be parsed.
    #[error("Invalid key chord '{0}'")]
    InvalidChord(String),
    /// A bind call listed no combos at all.
    #[error("No key chords given")]
    Empty,
}

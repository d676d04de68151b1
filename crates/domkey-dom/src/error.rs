use std::result::Result as StdResult;

use thiserror::Error;

use crate::ElementId;

/// Convenient result type for tree operations.
pub type Result<T> = StdResult<T, DomError>;

/// Errors reported by a [`crate::Dom`] implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomError {
    /// The selector is empty or only whitespace.
    #[error("empty selector")]
    EmptySelector,
    /// The selector uses syntax this tree cannot evaluate.
    #[error("unsupported selector: {0}")]
    UnsupportedSelector(String),
    /// The element handle does not belong to this tree.
    #[error("unknown element {0}")]
    UnknownElement(ElementId),
}

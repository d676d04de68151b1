use std::{io, path::PathBuf, result::Result as StdResult};

use thiserror::Error;

/// Errors reported by the `domkey` binary.
#[derive(Error, Debug)]
pub enum Error {
    /// Loading or validating the config failed.
    #[error(transparent)]
    Config(#[from] config::Error),

    /// The fixture document could not be read or parsed.
    #[error("fixture {}: {message}", .path.display())]
    Fixture {
        /// Fixture path.
        path: PathBuf,
        /// What went wrong.
        message: String,
    },

    /// Controller setup failed.
    #[error(transparent)]
    Engine(#[from] domkey_engine::Error),

    /// Building the fixture tree failed.
    #[error(transparent)]
    Dom(#[from] domkey_dom::DomError),

    /// A `--press` argument is not a key chord.
    #[error("not a key chord: '{0}'")]
    BadPress(String),

    /// `check` found selectors that do not parse.
    #[error("{0} invalid selector(s)")]
    InvalidSelectors(usize),

    /// Writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Multi-line rendering for the terminal; config errors carry an excerpt.
    pub fn pretty(&self) -> String {
        match self {
            Self::Config(e) => e.pretty(),
            Self::Engine(domkey_engine::Error::Config(e)) => e.pretty(),
            other => other.to_string(),
        }
    }
}

/// Result alias for the binary.
pub type Result<T> = StdResult<T, Error>;

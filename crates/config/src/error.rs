//! Error types for configuration loading and validation.

use std::{
    cmp::{max, min},
    fmt::Write as _,
    path::{Path, PathBuf},
};

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Errors produced while loading, parsing, or validating a configuration.
pub enum Error {
    #[error("{message}")]
    /// I/O error or unsupported file type.
    Read {
        /// Optional path associated with the read error.
        path: Option<PathBuf>,
        /// Human-readable error message.
        message: String,
    },
    #[error("{message}")]
    /// JSON or RON that does not parse into a [`crate::Config`].
    Parse {
        /// Optional path associated with the parse error.
        path: Option<PathBuf>,
        /// 1-based line number.
        line: usize,
        /// 1-based column number.
        col: usize,
        /// Human-readable error message.
        message: String,
        /// Rendered excerpt including a caret at the error location.
        excerpt: String,
    },
    #[error("{message}")]
    /// Well-formed config that breaks an invariant.
    Validation {
        /// Optional path associated with the validation error.
        path: Option<PathBuf>,
        /// Human-readable error message.
        message: String,
    },
}

impl Error {
    /// Validation error without a path.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            path: None,
            message: message.into(),
        }
    }

    /// Parse error at `(line, col)` in `source`.
    pub(crate) fn parse_at(source: &str, line: usize, col: usize, message: String) -> Self {
        let (line, col) = (line.max(1), col.max(1));
        Self::Parse {
            path: None,
            line,
            col,
            message,
            excerpt: excerpt_at(source, line, col),
        }
    }

    /// Attach `p` to this error.
    pub fn with_path(mut self, p: &Path) -> Self {
        match &mut self {
            Self::Read { path, .. } | Self::Parse { path, .. } | Self::Validation { path, .. } => {
                *path = Some(p.to_path_buf());
            }
        }
        self
    }

    /// Render a human-friendly error message including location and an excerpt when available.
    pub fn pretty(&self) -> String {
        let at = |p: &Option<PathBuf>| {
            p.as_ref()
                .map(|p| format!(" at {}", p.display()))
                .unwrap_or_default()
        };
        match self {
            Self::Read { path, message } => format!("Read error{}: {}", at(path), message),
            Self::Parse {
                path,
                line,
                col,
                message,
                excerpt,
            } => match path {
                Some(p) => format!(
                    "Config parse error at {}:{}:{}\n{}\n{}",
                    p.display(),
                    line,
                    col,
                    message,
                    excerpt
                ),
                None => format!(
                    "Config parse error at line {}, column {}\n{}\n{}",
                    line, col, message, excerpt
                ),
            },
            Self::Validation { path, message } => {
                format!("Config validation error{}\n{}", at(path), message)
            }
        }
    }

    /// Access the optional path attached to this error.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Read { path, .. } | Self::Parse { path, .. } | Self::Validation { path, .. } => {
                path.as_deref()
            }
        }
    }
}

/// Build a small 2-3 line excerpt with a caret at `(line_no, col_no)`.
pub fn excerpt_at(source: &str, line_no: usize, col_no: usize) -> String {
    let lines: Vec<&str> = source.lines().collect();
    let start = max(1usize, line_no.saturating_sub(2));
    let end = min(lines.len(), line_no + 1);

    let mut out = String::new();
    for n in start..=end {
        let gutter = format!(" {:>4} | ", n);
        let _ignored = writeln!(out, "{}{}", gutter, lines.get(n - 1).copied().unwrap_or(""));
        if n == line_no {
            let pad = gutter.len() + col_no.saturating_sub(1);
            let _ignored = writeln!(out, "{}^", " ".repeat(pad));
        }
    }
    out
}

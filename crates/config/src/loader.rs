//! Parse and load configuration files.

use std::{ffi::OsStr, fs, path::Path};

use tracing::debug;

use crate::{Config, Error, Result};

/// Supported config syntaxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// JSON with the page-author field names (`hotKeyConfig`, ...).
    Json,
    /// RON with the same field names.
    Ron,
}

impl Format {
    /// Pick a format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(OsStr::to_str) {
            Some("json") => Some(Self::Json),
            Some("ron") => Some(Self::Ron),
            _ => None,
        }
    }
}

/// Leading `line:col` of a RON error message.
fn ron_position(message: &str) -> (usize, usize) {
    let mut parts = message.splitn(3, ':');
    let num = |p: Option<&str>| {
        p.and_then(|s| {
            let digits: String = s.chars().take_while(char::is_ascii_digit).collect();
            digits.parse().ok()
        })
    };
    match (num(parts.next()), num(parts.next())) {
        (Some(line), Some(col)) => (line, col),
        _ => (1, 1),
    }
}

/// Parse and validate a config from source text.
pub fn load_from_str(source: &str, format: Format) -> Result<Config> {
    let config: Config = match format {
        Format::Json => serde_json::from_str(source)
            .map_err(|e| Error::parse_at(source, e.line(), e.column(), e.to_string()))?,
        Format::Ron => ron::from_str(source).map_err(|e| {
            let message = e.to_string();
            let (line, col) = ron_position(&message);
            Error::parse_at(source, line, col, message)
        })?,
    };
    config.validate()?;
    debug!(
        keys = config.keys.len(),
        hot_keys = config.hot_key_config.len(),
        regions = config.operation_control.len(),
        "config_loaded"
    );
    Ok(config)
}

/// Load and validate a config file; `.json` and `.ron` are accepted.
pub fn load_from_path(path: &Path) -> Result<Config> {
    let format = Format::from_path(path).ok_or_else(|| Error::Read {
        path: Some(path.to_path_buf()),
        message: "Unsupported config format (expected a .json or .ron file)".to_string(),
    })?;
    let source = fs::read_to_string(path).map_err(|e| Error::Read {
        path: Some(path.to_path_buf()),
        message: e.to_string(),
    })?;
    load_from_str(&source, format).map_err(|e| e.with_path(path))
}

//! Class names the focus tracker reads and writes.

use std::fmt::Display;

/// Class carried by the one element that currently holds focus.
pub const FOCUS_CONTAINER: &str = "hot-key-focus-container";

/// Class marking an element that carries an id class.
pub const ID_MARKER: &str = "hot-key-id";

/// Prefix of the id-bearing class, `hot-key-id=<id>`.
pub const ID_PREFIX: &str = "hot-key-id=";

/// Class string a page author puts on a focus region with id `id`.
///
/// `bind_class("list", "panel")` is `"panel hot-key-id hot-key-id=list"`.
pub fn bind_class(id: impl Display, extra: &str) -> String {
    let extra = extra.trim();
    if extra.is_empty() {
        format!("{ID_MARKER} {ID_PREFIX}{id}")
    } else {
        format!("{extra} {ID_MARKER} {ID_PREFIX}{id}")
    }
}

/// The id carried by a `hot-key-id=<id>` class.
pub fn id_from_class(class: &str) -> Option<&str> {
    class.strip_prefix(ID_PREFIX).filter(|id| !id.is_empty())
}

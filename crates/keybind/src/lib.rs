//! Key binding layer for domkey.
//!
//! - [`Chord`]: parse and normalize combos such as `"ctrl+shift+k"`
//! - [`KeyBinder`]: the contract the controller binds keys through
//! - [`Keyboard`]: an in-process binder that dispatches [`KeyEvent`]s to
//!   bound handlers after an admission [`Filter`]

mod chord;
mod error;
mod keyboard;

pub use chord::{Chord, Modifier};
pub use error::{Error, Result};
pub use keyboard::{Filter, KeyBinder, KeyEvent, Keyboard, Press, PressHandler, default_filter};

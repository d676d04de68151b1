use std::{collections::BTreeSet, sync::Arc};

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::{Chord, Error, Modifier, Result};

/// A key press as delivered by the host.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyEvent {
    /// Key name (e.g. `"k"`, `"ArrowUp"`, `"1"`).
    pub key: String,
    /// Modifiers held during the press.
    pub modifiers: BTreeSet<Modifier>,
    /// Tag name of the element that had keyboard focus, uppercase as browsers report it.
    pub target_tag: Option<String>,
    /// Class attribute of that element.
    pub target_class: Option<String>,
}

impl KeyEvent {
    /// A press of `key` with no modifiers and no target.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    /// Add a held modifier.
    pub fn with_modifier(mut self, m: Modifier) -> Self {
        self.modifiers.insert(m);
        self
    }

    /// Record the focused element the press originated from.
    pub fn with_target(mut self, tag: impl Into<String>, class: impl Into<String>) -> Self {
        self.target_tag = Some(tag.into().to_ascii_uppercase());
        self.target_class = Some(class.into());
        self
    }

    /// Chord for this press.
    pub fn chord(&self) -> Chord {
        let mut chord = Chord::key(&self.key);
        chord.modifiers = self.modifiers.clone();
        chord
    }
}

/// A dispatched press: the event plus the shortcut it matched, as written at bind time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Press {
    /// The originating event.
    pub event: KeyEvent,
    /// The combo that matched (trimmed, as passed to `bind`).
    pub shortcut: String,
}

/// Callback run for a matched press.
pub type PressHandler = Arc<dyn Fn(&Press) + Send + Sync>;

/// Admission predicate run before any handler; returning false drops the press.
pub type Filter = Arc<dyn Fn(&KeyEvent) -> bool + Send + Sync>;

/// Default admission: ignore presses typed into form fields.
pub fn default_filter() -> Filter {
    Arc::new(|ev: &KeyEvent| {
        !matches!(
            ev.target_tag.as_deref(),
            Some("INPUT" | "SELECT" | "TEXTAREA")
        )
    })
}

/// Minimal key binding API used by the domkey controller.
pub trait KeyBinder: Send + Sync {
    /// Bind every chord in the comma-separated `combos` to `handler`.
    fn bind(&self, combos: &str, handler: PressHandler) -> Result<()>;
    /// Remove all handlers bound to the chords in `combos`. Returns how many were removed.
    fn unbind(&self, combos: &str) -> usize;
    /// Replace the admission filter.
    fn set_filter(&self, filter: Filter);
}

/// One registered handler.
struct Binding {
    /// Parsed chord used for matching.
    chord: Chord,
    /// Combo text as given at bind time.
    shortcut: String,
    /// Handler to run.
    handler: PressHandler,
}

/// In-process key binder: hosts feed presses through [`Keyboard::press`].
pub struct Keyboard {
    /// Registered handlers in bind order.
    bindings: Mutex<Vec<Binding>>,
    /// Current admission filter.
    filter: Mutex<Filter>,
}

impl Default for Keyboard {
    fn default() -> Self {
        Self {
            bindings: Mutex::new(Vec::new()),
            filter: Mutex::new(default_filter()),
        }
    }
}

impl Keyboard {
    /// Create a keyboard with the default filter and no bindings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatch a press. Returns the number of handlers that ran.
    pub fn press(&self, event: &KeyEvent) -> usize {
        let filter = self.filter.lock().clone();
        if !filter(event) {
            trace!(key = %event.key, "keyboard_press_filtered");
            return 0;
        }
        let chord = event.chord();
        let matched: Vec<(String, PressHandler)> = self
            .bindings
            .lock()
            .iter()
            .filter(|b| b.chord == chord)
            .map(|b| (b.shortcut.clone(), b.handler.clone()))
            .collect();
        trace!(chord = %chord, handlers = matched.len(), "keyboard_press");
        for (shortcut, handler) in &matched {
            handler(&Press {
                event: event.clone(),
                shortcut: shortcut.clone(),
            });
        }
        matched.len()
    }

    /// Snapshot of bound shortcuts, sorted and de-duplicated.
    pub fn bound(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .bindings
            .lock()
            .iter()
            .map(|b| b.chord.to_string())
            .collect();
        out.sort();
        out.dedup();
        out
    }
}

impl KeyBinder for Keyboard {
    fn bind(&self, combos: &str, handler: PressHandler) -> Result<()> {
        let chords = Chord::parse_list(combos).map_err(Error::InvalidChord)?;
        if chords.is_empty() {
            return Err(Error::Empty);
        }
        let shortcuts = combos.split(',').map(str::trim).filter(|p| !p.is_empty());
        let mut bindings = self.bindings.lock();
        for (chord, shortcut) in chords.into_iter().zip(shortcuts) {
            debug!("Binding key: {}", chord);
            bindings.push(Binding {
                chord,
                shortcut: shortcut.to_string(),
                handler: handler.clone(),
            });
        }
        Ok(())
    }

    fn unbind(&self, combos: &str) -> usize {
        let Ok(chords) = Chord::parse_list(combos) else {
            return 0;
        };
        let mut bindings = self.bindings.lock();
        let before = bindings.len();
        bindings.retain(|b| !chords.contains(&b.chord));
        let removed = before - bindings.len();
        if removed > 0 {
            debug!("Unbound {} handler(s) for {}", removed, combos);
        }
        removed
    }

    fn set_filter(&self, filter: Filter) {
        *self.filter.lock() = filter;
    }
}

use std::{collections::BTreeSet, fmt};

/// Modifier keys, in canonical display order.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum Modifier {
    /// Command / Meta / Windows key.
    Meta,
    /// Control.
    Ctrl,
    /// Alt / Option.
    Alt,
    /// Shift.
    Shift,
}

impl Modifier {
    /// Parse a modifier name, accepting the usual aliases (case-insensitive).
    pub fn from_spec(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "cmd" | "command" | "meta" | "super" | "⌘" => Some(Self::Meta),
            "ctrl" | "control" | "⌃" => Some(Self::Ctrl),
            "alt" | "opt" | "option" | "⌥" => Some(Self::Alt),
            "shift" | "⇧" => Some(Self::Shift),
            _ => None,
        }
    }

    /// Canonical lowercase spec string.
    pub fn to_spec(self) -> &'static str {
        match self {
            Self::Meta => "cmd",
            Self::Ctrl => "ctrl",
            Self::Alt => "alt",
            Self::Shift => "shift",
        }
    }
}

/// Canonical name for a key spec, folding common aliases.
fn canonical_key(raw: &str) -> String {
    let lower = raw.to_ascii_lowercase();
    let name = match lower.as_str() {
        "arrowup" => "up",
        "arrowdown" => "down",
        "arrowleft" => "left",
        "arrowright" => "right",
        "esc" => "escape",
        "return" => "enter",
        "del" => "delete",
        "spacebar" => "space",
        other => other,
    };
    name.to_string()
}

/// A key chord: a set of modifiers plus a single key.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Chord {
    /// Modifier keys held down for this chord.
    pub modifiers: BTreeSet<Modifier>,
    /// The non-modifier key, canonical lowercase name.
    pub key: String,
}

impl Chord {
    /// Build a chord for a bare key.
    pub fn key(key: &str) -> Self {
        Self {
            modifiers: BTreeSet::new(),
            key: canonical_key(key),
        }
    }

    /// Parses a chord specification of the form "shift+alt+k".
    ///
    /// - Case-insensitive for both modifiers and the key.
    /// - Components are separated by "+"; the last component is always the key.
    /// - A lone "+" is the plus key.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        if s == "+" {
            return Some(Self::key("+"));
        }
        let mut buf: Vec<&str> = s.split('+').collect();
        let key_raw = buf.pop()?.trim();
        if key_raw.is_empty() || Modifier::from_spec(key_raw).is_some() {
            return None;
        }
        let mut modifiers = BTreeSet::new();
        for m in buf {
            modifiers.insert(Modifier::from_spec(m.trim())?);
        }
        Some(Self {
            modifiers,
            key: canonical_key(key_raw),
        })
    }

    /// Parse a comma-separated list of chords, e.g. `"1, ctrl+k, up"`.
    pub fn parse_list(s: &str) -> Result<Vec<Self>, String> {
        let specs: Vec<&str> = s
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        specs
            .into_iter()
            .map(|p| Self::parse(p).ok_or_else(|| p.to_string()))
            .collect()
    }

    /// Canonical string form: modifiers in canonical order, then the key.
    pub fn to_string_canonical(&self) -> String {
        let mut out: Vec<&str> = self.modifiers.iter().map(|m| m.to_spec()).collect();
        out.push(&self.key);
        out.join("+")
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string_canonical())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_basic_chord() {
        let c = Chord::parse("shift+opt+K").expect("parse");
        assert!(c.modifiers.contains(&Modifier::Shift));
        assert!(c.modifiers.contains(&Modifier::Alt));
        assert_eq!(c.key, "k");
        assert_eq!(c.to_string(), "alt+shift+k");
    }

    #[test]
    fn aliases_fold() {
        assert_eq!(Chord::parse("ArrowUp"), Chord::parse("up"));
        assert_eq!(Chord::parse("Control+Esc").expect("parse").to_string(), "ctrl+escape");
        assert_eq!(Chord::parse("+").expect("plus").key, "+");
    }

    #[test]
    fn rejects_bad_specs() {
        assert_eq!(Chord::parse(""), None);
        assert_eq!(Chord::parse("ctrl+"), None);
        assert_eq!(Chord::parse("ctrl"), None);
        assert_eq!(Chord::parse("hyper+k"), None);
    }

    #[test]
    fn idempotence_roundtrip() {
        let inputs = ["shift+opt+k", "CTRL+ALT+Space", "cmd+1", "meta+shift+down"];
        for s in inputs {
            let c = Chord::parse(s).expect("parse");
            let spec = c.to_string();
            let c2 = Chord::parse(&spec).expect("reparse");
            assert_eq!(c, c2, "idempotent for {} => {}", s, spec);
        }
    }

    #[test]
    fn list_parsing() {
        let chords = Chord::parse_list("1, ctrl+k,up").expect("list");
        let names: Vec<String> = chords.iter().map(Chord::to_string).collect();
        assert_eq!(names, vec!["1", "ctrl+k", "up"]);
        assert_eq!(Chord::parse_list("a, ctrl+"), Err("ctrl+".to_string()));
    }
}

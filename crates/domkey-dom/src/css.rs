//! Minimal CSS selector parsing for [`crate::MemDom`].
//!
//! Supported: `*`, tag names, `.class`, `#id`, `[attr]`, `[attr=value]`, and
//! the descendant combinator (whitespace). Anything else is rejected.

use crate::{DomError, Result};

/// Attribute condition inside `[...]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AttrCond {
    /// `[key]`
    Exists(String),
    /// `[key=value]`
    Eq(String, String),
}

/// One compound selector such as `button.primary[type=submit]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Compound {
    /// Tag name (lowercased); `None` for `*` or when omitted.
    pub(crate) tag: Option<String>,
    /// Required `id` attribute.
    pub(crate) id: Option<String>,
    /// Required classes.
    pub(crate) classes: Vec<String>,
    /// Attribute conditions.
    pub(crate) attrs: Vec<AttrCond>,
}

/// Characters allowed in identifiers.
fn is_ident(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

/// Consume an identifier starting at `*i`.
fn take_ident(chars: &[char], i: &mut usize) -> String {
    let start = *i;
    while *i < chars.len() && is_ident(chars[*i]) {
        *i += 1;
    }
    chars[start..*i].iter().collect()
}

/// Parse one whitespace-free compound selector.
fn parse_compound(part: &str, full: &str) -> Result<Compound> {
    let unsupported = || DomError::UnsupportedSelector(full.to_string());
    let chars: Vec<char> = part.chars().collect();
    let mut out = Compound::default();
    let mut i = 0;

    if chars.first() == Some(&'*') {
        i = 1;
    } else {
        let tag = take_ident(&chars, &mut i);
        if !tag.is_empty() {
            out.tag = Some(tag.to_ascii_lowercase());
        }
    }

    while i < chars.len() {
        match chars[i] {
            '.' => {
                i += 1;
                let name = take_ident(&chars, &mut i);
                if name.is_empty() {
                    return Err(unsupported());
                }
                out.classes.push(name);
            }
            '#' => {
                i += 1;
                let name = take_ident(&chars, &mut i);
                if name.is_empty() {
                    return Err(unsupported());
                }
                out.id = Some(name);
            }
            '[' => {
                let close = chars[i..]
                    .iter()
                    .position(|c| *c == ']')
                    .ok_or_else(unsupported)?;
                let inner: String = chars[i + 1..i + close].iter().collect();
                let cond = match inner.split_once('=') {
                    Some((key, value)) => AttrCond::Eq(
                        key.trim().to_string(),
                        value.trim().trim_matches(['"', '\'']).to_string(),
                    ),
                    None => AttrCond::Exists(inner.trim().to_string()),
                };
                if matches!(&cond, AttrCond::Exists(k) | AttrCond::Eq(k, _) if k.is_empty()) {
                    return Err(unsupported());
                }
                out.attrs.push(cond);
                i += close + 1;
            }
            _ => return Err(unsupported()),
        }
    }
    Ok(out)
}

/// Parse a descendant chain into compounds, outermost first.
pub(crate) fn parse_chain(selector: &str) -> Result<Vec<Compound>> {
    let parts: Vec<&str> = selector.split_whitespace().collect();
    if parts.is_empty() {
        return Err(DomError::EmptySelector);
    }
    parts.iter().map(|p| parse_compound(p, selector)).collect()
}

//! The operation selector language.
//!
//! An expression is a whitespace-separated chain of tokens:
//!
//! - `sel` joins the running descendant chain;
//! - `sel=text` closes the chain (including `sel`) into one step that keeps
//!   the match whose text content is exactly `text`;
//! - `sel:N` closes the chain into one step that keeps the `N`th match
//!   (zero-based).
//!
//! Each closed step is evaluated inside the element found by the previous
//! step. Plain tokens left after the last filtered token form a final step
//! that keeps the first match. Any step without a match ends resolution.
//!
//! `=` only counts outside `[...]`, so `input[type=submit]` is a plain token,
//! and `:` only counts when followed by digits up to the end of the token, so
//! `li:first-child` is plain too.

use domkey_dom::{Dom, ElementId, Scope};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, trace};


/// `base:index` with the index running to the end of the token.
static INDEX_SUFFIX: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^(?P<base>.*):(?P<index>[0-9]+)$").ok());

/// Why an expression could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    /// Nothing but whitespace.
    #[error("empty selector expression")]
    Empty,
    /// A filtered token without a selector before `=` or `:`.
    #[error("filter token '{0}' has no selector")]
    EmptyBase(String),
}

/// Post-query filter of a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Keep the match whose text content equals this exactly.
    Text(String),
    /// Keep the match at this zero-based position.
    Index(usize),
}

/// One query of a parsed expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorStep {
    /// Descendant chain handed to the document.
    pub selector: String,
    /// Filter applied to the matches; `None` keeps the first.
    pub filter: Option<Filter>,
}

impl SelectorStep {
    /// Evaluate this step below `scope`.
    pub fn evaluate(&self, dom: &dyn Dom, scope: Scope) -> Option<ElementId> {
        let result = match &self.filter {
            None => dom.query(scope, &self.selector),
            Some(Filter::Index(i)) => dom
                .query_all(scope, &self.selector)
                .map(|all| all.get(*i).copied()),
            Some(Filter::Text(text)) => dom.query_all(scope, &self.selector).map(|all| {
                all.into_iter()
                    .find(|el| dom.text_content(*el).as_deref() == Some(text.as_str()))
            }),
        };
        match result {
            Ok(found) => found,
            Err(e) => {
                debug!(selector = %self.selector, error = %e, "selector_query_failed");
                None
            }
        }
    }
}

/// Byte offset of the first `=` outside brackets.
fn text_separator(token: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in token.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            '=' if depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

/// Split a token into its selector and optional filter.
fn split_token(token: &str) -> Result<(&str, Option<Filter>), SelectorError> {
    if let Some(pos) = text_separator(token) {
        let base = &token[..pos];
        if base.is_empty() {
            return Err(SelectorError::EmptyBase(token.to_string()));
        }
        return Ok((base, Some(Filter::Text(token[pos + 1..].to_string()))));
    }
    let indexed = INDEX_SUFFIX.as_ref().and_then(|re| re.captures(token));
    if let Some(caps) = indexed
        && let (Some(base), Some(index)) = (caps.name("base"), caps.name("index"))
        && let Ok(index) = index.as_str().parse::<usize>()
    {
        if base.as_str().is_empty() {
            return Err(SelectorError::EmptyBase(token.to_string()));
        }
        return Ok((base.as_str(), Some(Filter::Index(index))));
    }
    Ok((token, None))
}

/// Parse an expression into its steps.
pub fn parse(expr: &str) -> Result<Vec<SelectorStep>, SelectorError> {
    let mut steps = Vec::new();
    let mut joined: Vec<&str> = Vec::new();
    for token in expr.split_whitespace() {
        let (base, filter) = split_token(token)?;
        joined.push(base);
        if filter.is_some() {
            steps.push(SelectorStep {
                selector: joined.join(" "),
                filter,
            });
            joined.clear();
        }
    }
    if !joined.is_empty() {
        steps.push(SelectorStep {
            selector: joined.join(" "),
            filter: None,
        });
    }
    if steps.is_empty() {
        return Err(SelectorError::Empty);
    }
    Ok(steps)
}

/// Evaluate parsed steps, each inside the previous step's element.
pub fn resolve_steps(dom: &dyn Dom, steps: &[SelectorStep], scope: Scope) -> Option<ElementId> {
    let mut scope = scope;
    let mut found = None;
    for (i, step) in steps.iter().enumerate() {
        let Some(el) = step.evaluate(dom, scope) else {
            trace!(step = i, selector = %step.selector, "selector_step_miss");
            return None;
        };
        found = Some(el);
        scope = Scope::Element(el);
    }
    found
}

/// Resolve `expr` below `scope`. Invalid expressions resolve to nothing.
pub fn resolve(dom: &dyn Dom, expr: &str, scope: Scope) -> Option<ElementId> {
    match parse(expr) {
        Ok(steps) => resolve_steps(dom, &steps, scope),
        Err(e) => {
            debug!(expr, error = %e, "selector_parse_failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use domkey_dom::{ElementSpec, MemDom};

    use super::*;

    fn step(selector: &str, filter: Option<Filter>) -> SelectorStep {
        SelectorStep {
            selector: selector.to_string(),
            filter,
        }
    }

    #[test]
    fn parse_joins_plain_tokens() {
        assert_eq!(parse("  .a  li  span ").unwrap(), vec![step(".a li span", None)]);
    }

    #[test]
    fn parse_closes_chain_on_filters() {
        assert_eq!(
            parse(".menu li.item:2 a=Open .icon").unwrap(),
            vec![
                step(".menu li.item", Some(Filter::Index(2))),
                step("a", Some(Filter::Text("Open".into()))),
                step(".icon", None),
            ]
        );
    }

    #[test]
    fn parse_token_edge_cases() {
        assert_eq!(
            parse("input[type=submit]").unwrap(),
            vec![step("input[type=submit]", None)]
        );
        assert_eq!(
            parse("li:first-child").unwrap(),
            vec![step("li:first-child", None)]
        );
        assert_eq!(
            parse("td=a=b").unwrap(),
            vec![step("td", Some(Filter::Text("a=b".into())))]
        );
        assert_eq!(
            parse("button[name=x]=Go").unwrap(),
            vec![step("button[name=x]", Some(Filter::Text("Go".into())))]
        );
        assert_eq!(parse("li:0").unwrap(), vec![step("li", Some(Filter::Index(0)))]);
        assert_eq!(
            parse("p=").unwrap(),
            vec![step("p", Some(Filter::Text(String::new())))]
        );
    }

    #[test]
    fn parse_errors() {
        assert_eq!(parse(""), Err(SelectorError::Empty));
        assert_eq!(parse(" \t"), Err(SelectorError::Empty));
        assert_eq!(parse("=Hello"), Err(SelectorError::EmptyBase("=Hello".into())));
        assert_eq!(parse(".a :3"), Err(SelectorError::EmptyBase(":3".into())));
    }

    fn fixture() -> MemDom {
        let dom = MemDom::new();
        dom.append(
            Scope::Document,
            ElementSpec::new("div")
                .class("foo")
                .text("Hello World"),
        )
        .unwrap();
        dom.append(Scope::Document, ElementSpec::new("div").class("foo").text("Hello"))
            .unwrap();
        dom.append(
            Scope::Document,
            ElementSpec::new("ul")
                .class("list")
                .child(ElementSpec::new("li").class("item").text("a"))
                .child(ElementSpec::new("li").class("item").text("b"))
                .child(
                    ElementSpec::new("li")
                        .class("item")
                        .child(ElementSpec::new("span").class("label").text("c")),
                ),
        )
        .unwrap();
        dom
    }

    #[test]
    fn text_filter_is_exact() {
        let dom = fixture();
        let hit = resolve(&dom, "div.foo=Hello", Scope::Document).unwrap();
        assert_eq!(dom.text_content(hit).as_deref(), Some("Hello"));
        assert_eq!(resolve(&dom, "div.foo=Hell", Scope::Document), None);
    }

    #[test]
    fn index_filter_is_zero_based() {
        let dom = fixture();
        let all = dom.query_all(Scope::Document, "li.item").unwrap();
        assert_eq!(resolve(&dom, "li.item:0", Scope::Document), Some(all[0]));
        assert_eq!(resolve(&dom, "li.item:2", Scope::Document), Some(all[2]));
        assert_eq!(resolve(&dom, "li.item:3", Scope::Document), None);
    }

    #[test]
    fn later_steps_search_inside_earlier_results() {
        let dom = fixture();
        let label = resolve(&dom, ".list li:2 .label", Scope::Document).unwrap();
        assert_eq!(dom.text_content(label).as_deref(), Some("c"));
        assert_eq!(resolve(&dom, ".list li:1 .label", Scope::Document), None);
    }

    #[test]
    fn unsupported_or_invalid_selectors_miss() {
        let dom = fixture();
        assert_eq!(resolve(&dom, "ul > li", Scope::Document), None);
        assert_eq!(resolve(&dom, "", Scope::Document), None);
    }
}

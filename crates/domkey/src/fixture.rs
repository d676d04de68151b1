//! RON fixtures describing a document tree for `simulate`.
//!
//! ```ron
//! [
//!     (tag: "section", class: "hot-key-focus-container hot-key-id hot-key-id=main", children: [
//!         (tag: "button", class: "open", renders: [
//!             (tag: "div", class: "dialog", children: [(tag: "button", class: "ok")]),
//!         ]),
//!     ]),
//! ]
//! ```
//!
//! `renders` lists elements appended inside a node each time it is clicked,
//! which is how a fixture models a click that opens a dialog.

use std::{collections::BTreeMap, fs, path::Path, sync::Arc};

use domkey_dom::{ElementId, ElementSpec, MemDom, Scope};
use serde::Deserialize;
use tracing::debug;

use crate::{Error, Result};

/// One element in a fixture.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Node {
    /// Tag name.
    pub tag: String,
    /// `id` attribute.
    pub id: Option<String>,
    /// Whitespace-separated classes.
    pub class: String,
    /// Own text.
    pub text: String,
    /// Other attributes.
    pub attrs: BTreeMap<String, String>,
    /// Child elements.
    pub children: Vec<Self>,
    /// Elements appended inside this one on every click.
    pub renders: Vec<Self>,
}

impl Node {
    /// This node alone, without children.
    fn spec(&self) -> ElementSpec {
        let mut spec = ElementSpec::new(&self.tag).class(&self.class).text(&self.text);
        if let Some(id) = &self.id {
            spec = spec.id(id);
        }
        for (k, v) in &self.attrs {
            spec = spec.attr(k, v);
        }
        spec
    }

    /// This node and its whole subtree.
    fn spec_tree(&self) -> ElementSpec {
        self.children
            .iter()
            .fold(self.spec(), |spec, child| spec.child(child.spec_tree()))
    }
}

/// Parse fixture text.
pub fn parse(src: &str, path: &Path) -> Result<Vec<Node>> {
    ron::from_str(src).map_err(|e| Error::Fixture {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Read and parse a fixture file.
pub fn load(path: &Path) -> Result<Vec<Node>> {
    let src = fs::read_to_string(path).map_err(|e| Error::Fixture {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    parse(&src, path)
}

/// Append `node` under `parent`, wiring `renders` to click handlers.
fn append(dom: &MemDom, parent: Scope, node: &Node) -> Result<ElementId> {
    let el = dom.append(parent, node.spec())?;
    for child in &node.children {
        append(dom, Scope::Element(el), child)?;
    }
    if !node.renders.is_empty() {
        let rendered: Vec<ElementSpec> = node.renders.iter().map(Node::spec_tree).collect();
        debug!(%el, count = rendered.len(), "fixture_renders");
        dom.on_click(el, move |dom, el| {
            for spec in &rendered {
                // Click handlers cannot report errors; `el` is live while clicked.
                dom.append(Scope::Element(el), spec.clone()).ok();
            }
        });
    }
    Ok(el)
}

/// Build a tree from fixture nodes.
pub fn build(nodes: &[Node]) -> Result<Arc<MemDom>> {
    let dom = Arc::new(MemDom::new());
    for node in nodes {
        append(&dom, Scope::Document, node)?;
    }
    Ok(dom)
}

//! Arena-backed in-memory document.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use parking_lot::Mutex;
use tracing::trace;

use crate::{
    Dom, DomError, ElementId, MutationCallback, MutationKind, MutationRecord, ObserveConfig,
    ObserverId, Result, Scope,
    css::{self, AttrCond, Compound},
};

/// Handler run after an element is clicked. Receives the tree so it can mutate it.
type ClickHandler = Arc<dyn Fn(&MemDom, ElementId) + Send + Sync>;

/// Declarative description of an element subtree to insert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementSpec {
    /// Tag name.
    pub tag: String,
    /// Optional `id` attribute.
    pub id: Option<String>,
    /// Class names.
    pub classes: Vec<String>,
    /// Other attributes.
    pub attrs: Vec<(String, String)>,
    /// Own text, placed before any child text.
    pub text: String,
    /// Child elements.
    pub children: Vec<Self>,
}

impl ElementSpec {
    /// Start a spec for `tag`.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Set the `id` attribute.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Add one class, or several separated by whitespace.
    pub fn class(mut self, classes: &str) -> Self {
        self.classes
            .extend(classes.split_whitespace().map(str::to_string));
        self
    }

    /// Set an attribute.
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((key.into(), value.into()));
        self
    }

    /// Set the element's own text.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Append a child element.
    pub fn child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }
}

/// Stored element.
#[derive(Debug, Clone)]
struct Node {
    /// Parent element; `None` for document-level nodes and detached nodes.
    parent: Option<ElementId>,
    /// Child elements in order.
    children: Vec<ElementId>,
    /// Lowercased tag name.
    tag: String,
    /// Attributes, including `id`.
    attrs: BTreeMap<String, String>,
    /// Ordered class list.
    classes: Vec<String>,
    /// Own text.
    text: String,
}

/// Tree storage guarded by one lock.
#[derive(Debug, Default)]
struct Tree {
    /// Arena of every node ever created.
    nodes: Vec<Node>,
    /// Document-level elements in order.
    roots: Vec<ElementId>,
    /// Click log in dispatch order.
    clicks: Vec<ElementId>,
}

impl Tree {
    /// Node for `id`, if it exists.
    fn node(&self, id: ElementId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Mutable node for `id`.
    fn node_mut(&mut self, id: ElementId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// Whether `id` hangs off a document root.
    fn is_connected(&self, id: ElementId) -> bool {
        let mut cursor = id;
        loop {
            match self.node(cursor).and_then(|n| n.parent) {
                Some(p) => cursor = p,
                None => return self.roots.contains(&cursor),
            }
        }
    }

    /// Insert `spec` and its children under `parent`. Does not link `parent` to the new node.
    fn build(&mut self, parent: Option<ElementId>, spec: ElementSpec) -> ElementId {
        let id = ElementId(self.nodes.len());
        let mut attrs: BTreeMap<String, String> = spec.attrs.into_iter().collect();
        if let Some(el_id) = spec.id {
            attrs.insert("id".to_string(), el_id);
        }
        self.nodes.push(Node {
            parent,
            children: Vec::new(),
            tag: spec.tag.to_ascii_lowercase(),
            attrs,
            classes: spec.classes,
            text: spec.text,
        });
        for child in spec.children {
            let cid = self.build(Some(id), child);
            self.nodes[id.0].children.push(cid);
        }
        id
    }

    /// Element ids below `scope` in document order.
    fn descendants(&self, scope: Scope) -> Vec<ElementId> {
        let start: Vec<ElementId> = match scope {
            Scope::Document => self.roots.clone(),
            Scope::Element(id) => self.node(id).map(|n| n.children.clone()).unwrap_or_default(),
        };
        let mut out = Vec::new();
        let mut stack: Vec<ElementId> = start.into_iter().rev().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(n) = self.node(id) {
                stack.extend(n.children.iter().rev().copied());
            }
        }
        out
    }

    /// Own text followed by every descendant's, in document order.
    fn text_content(&self, id: ElementId) -> String {
        let Some(n) = self.node(id) else {
            return String::new();
        };
        let mut out = n.text.clone();
        for child in &n.children {
            out.push_str(&self.text_content(*child));
        }
        out
    }

    /// `id` and its siblings, in order. Detached nodes have none.
    fn siblings(&self, id: ElementId) -> Option<&[ElementId]> {
        match self.node(id)?.parent {
            Some(p) => self.node(p).map(|n| n.children.as_slice()),
            None if self.roots.contains(&id) => Some(self.roots.as_slice()),
            None => None,
        }
    }

    /// Next (`forward`) or previous sibling.
    fn sibling(&self, id: ElementId, forward: bool) -> Option<ElementId> {
        let sibs = self.siblings(id)?;
        let pos = sibs.iter().position(|s| *s == id)?;
        if forward {
            sibs.get(pos + 1).copied()
        } else {
            pos.checked_sub(1).and_then(|p| sibs.get(p).copied())
        }
    }

    /// Whether `id` satisfies every part of `c`.
    fn matches_compound(&self, id: ElementId, c: &Compound) -> bool {
        let Some(n) = self.node(id) else {
            return false;
        };
        if let Some(tag) = &c.tag
            && &n.tag != tag
        {
            return false;
        }
        if let Some(want) = &c.id
            && n.attrs.get("id") != Some(want)
        {
            return false;
        }
        if c.classes.iter().any(|cl| !n.classes.contains(cl)) {
            return false;
        }
        c.attrs.iter().all(|cond| match cond {
            AttrCond::Exists(k) => k == "class" || n.attrs.contains_key(k),
            AttrCond::Eq(k, v) if k == "class" => &n.classes.join(" ") == v,
            AttrCond::Eq(k, v) => n.attrs.get(k) == Some(v),
        })
    }

    /// Descendant-combinator match: last compound on `id`, earlier ones on ancestors.
    fn matches_chain(&self, id: ElementId, chain: &[Compound]) -> bool {
        let Some((last, rest)) = chain.split_last() else {
            return false;
        };
        if !self.matches_compound(id, last) {
            return false;
        }
        let mut cursor = self.node(id).and_then(|n| n.parent);
        for compound in rest.iter().rev() {
            loop {
                let Some(anc) = cursor else {
                    return false;
                };
                cursor = self.node(anc).and_then(|n| n.parent);
                if self.matches_compound(anc, compound) {
                    break;
                }
            }
        }
        true
    }

    /// `target` followed by its ancestors, innermost first, ending with the document.
    fn ancestry(&self, target: Scope) -> Vec<Scope> {
        let mut out = vec![target];
        if let Scope::Element(mut id) = target {
            while let Some(p) = self.node(id).and_then(|n| n.parent) {
                out.push(Scope::Element(p));
                id = p;
            }
            out.push(Scope::Document);
        }
        out
    }
}

/// Registered mutation observer.
struct Observer {
    /// Registration handle.
    id: ObserverId,
    /// Observed node.
    target: Scope,
    /// Mutation filter.
    config: ObserveConfig,
    /// User callback.
    callback: MutationCallback,
}

/// In-memory [`Dom`] implementation.
///
/// Selector support covers `*`, tag names, `.class`, `#id`, `[attr]`,
/// `[attr=value]` and the descendant combinator. Queries scoped to an element
/// match ancestors above the scope, as a browser's `querySelectorAll` does,
/// but only return descendants of the scope.
///
/// Clicks are recorded (see [`MemDom::clicks`]) and may run a handler
/// installed with [`MemDom::on_click`], which is how tests model "clicking
/// this button renders a dialog".
#[derive(Default)]
pub struct MemDom {
    /// Nodes, roots and the click log.
    tree: Mutex<Tree>,
    /// Per-element click handlers.
    handlers: Mutex<HashMap<ElementId, ClickHandler>>,
    /// Attached observers.
    observers: Mutex<Vec<Observer>>,
    /// Next observer id.
    next_observer: AtomicU64,
}

impl MemDom {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `spec` as the last child of `parent`.
    pub fn append(&self, parent: Scope, spec: ElementSpec) -> Result<ElementId> {
        let (id, ancestry) = {
            let mut tree = self.tree.lock();
            match parent {
                Scope::Document => {
                    let id = tree.build(None, spec);
                    tree.roots.push(id);
                    (id, tree.ancestry(parent))
                }
                Scope::Element(p) => {
                    if tree.node(p).is_none() {
                        return Err(DomError::UnknownElement(p));
                    }
                    let id = tree.build(Some(p), spec);
                    if let Some(n) = tree.node_mut(p) {
                        n.children.push(id);
                    }
                    (id, tree.ancestry(parent))
                }
            }
        };
        trace!(%id, ?parent, "mem_dom_append");
        self.notify(&ancestry, MutationKind::ChildList);
        Ok(id)
    }

    /// Detach an element (and its subtree) from the document.
    pub fn remove(&self, el: ElementId) -> bool {
        let ancestry = {
            let mut tree = self.tree.lock();
            let Some(parent) = tree.node(el).map(|n| n.parent) else {
                return false;
            };
            match parent {
                Some(p) => {
                    if let Some(n) = tree.node_mut(p) {
                        n.children.retain(|c| *c != el);
                    }
                    if let Some(n) = tree.node_mut(el) {
                        n.parent = None;
                    }
                    tree.ancestry(Scope::Element(p))
                }
                None => {
                    let before = tree.roots.len();
                    tree.roots.retain(|c| *c != el);
                    if tree.roots.len() == before {
                        return false;
                    }
                    tree.ancestry(Scope::Document)
                }
            }
        };
        self.notify(&ancestry, MutationKind::ChildList);
        true
    }

    /// Replace the element's own text.
    pub fn set_text(&self, el: ElementId, text: impl Into<String>) -> Result<()> {
        let ancestry = {
            let mut tree = self.tree.lock();
            let node = tree.node_mut(el).ok_or(DomError::UnknownElement(el))?;
            node.text = text.into();
            tree.ancestry(Scope::Element(el))
        };
        self.notify(&ancestry, MutationKind::ChildList);
        Ok(())
    }

    /// Tag name of an element.
    pub fn tag(&self, el: ElementId) -> Option<String> {
        self.tree.lock().node(el).map(|n| n.tag.clone())
    }

    /// Attribute value of an element.
    pub fn attr(&self, el: ElementId, name: &str) -> Option<String> {
        self.tree
            .lock()
            .node(el)
            .and_then(|n| n.attrs.get(name).cloned())
    }

    /// Parent element, if any.
    pub fn parent(&self, el: ElementId) -> Option<ElementId> {
        self.tree.lock().node(el).and_then(|n| n.parent)
    }

    /// Whether the element is currently attached to the document.
    pub fn is_connected(&self, el: ElementId) -> bool {
        self.tree.lock().is_connected(el)
    }

    /// Short human-readable description, e.g. `button#ok.primary`.
    pub fn describe(&self, el: ElementId) -> String {
        let tree = self.tree.lock();
        let Some(n) = tree.node(el) else {
            return format!("<unknown {el}>");
        };
        let mut out = n.tag.clone();
        if let Some(id) = n.attrs.get("id") {
            out.push('#');
            out.push_str(id);
        }
        for c in &n.classes {
            out.push('.');
            out.push_str(c);
        }
        out
    }

    /// Every click dispatched so far, in order.
    pub fn clicks(&self) -> Vec<ElementId> {
        self.tree.lock().clicks.clone()
    }

    /// Forget the click log.
    pub fn clear_clicks(&self) {
        self.tree.lock().clicks.clear();
    }

    /// Run `handler` after every click on `el`, replacing any previous handler.
    pub fn on_click<F>(&self, el: ElementId, handler: F)
    where
        F: Fn(&Self, ElementId) + Send + Sync + 'static,
    {
        self.handlers.lock().insert(el, Arc::new(handler));
    }

    /// Deliver a mutation to every observer interested in it.
    fn notify(&self, ancestry: &[Scope], kind: MutationKind) {
        let Some(target) = ancestry.first().copied() else {
            return;
        };
        let callbacks: Vec<MutationCallback> = self
            .observers
            .lock()
            .iter()
            .filter(|o| match &kind {
                MutationKind::ChildList => o.config.child_list,
                MutationKind::Attributes { .. } => o.config.attributes,
            })
            .filter(|o| o.target == target || (o.config.subtree && ancestry.contains(&o.target)))
            .map(|o| o.callback.clone())
            .collect();
        if callbacks.is_empty() {
            return;
        }
        let records = [MutationRecord { target, kind }];
        for cb in callbacks {
            cb(&records);
        }
    }

    /// Apply a class edit, notifying observers only when the list changed.
    fn edit_classes(&self, el: ElementId, class: &str, add: bool) {
        let ancestry = {
            let mut tree = self.tree.lock();
            let Some(node) = tree.node_mut(el) else {
                return;
            };
            let present = node.classes.iter().any(|c| c == class);
            match (add, present) {
                (true, false) => node.classes.push(class.to_string()),
                (false, true) => node.classes.retain(|c| c != class),
                _ => return,
            }
            tree.ancestry(Scope::Element(el))
        };
        self.notify(
            &ancestry,
            MutationKind::Attributes {
                name: "class".to_string(),
            },
        );
    }
}

impl Dom for MemDom {
    fn query_all(&self, scope: Scope, selector: &str) -> Result<Vec<ElementId>> {
        let chain = css::parse_chain(selector)?;
        let tree = self.tree.lock();
        if let Scope::Element(id) = scope
            && tree.node(id).is_none()
        {
            return Err(DomError::UnknownElement(id));
        }
        Ok(tree
            .descendants(scope)
            .into_iter()
            .filter(|id| tree.matches_chain(*id, &chain))
            .collect())
    }

    fn text_content(&self, el: ElementId) -> Option<String> {
        let tree = self.tree.lock();
        tree.node(el)?;
        Some(tree.text_content(el))
    }

    fn click(&self, el: ElementId) {
        {
            let mut tree = self.tree.lock();
            if tree.node(el).is_none() {
                return;
            }
            tree.clicks.push(el);
        }
        trace!(%el, "mem_dom_click");
        let handler = self.handlers.lock().get(&el).cloned();
        if let Some(handler) = handler {
            handler(self, el);
        }
    }

    fn class_list(&self, el: ElementId) -> Vec<String> {
        self.tree
            .lock()
            .node(el)
            .map(|n| n.classes.clone())
            .unwrap_or_default()
    }

    fn add_class(&self, el: ElementId, class: &str) {
        self.edit_classes(el, class, true);
    }

    fn remove_class(&self, el: ElementId, class: &str) {
        self.edit_classes(el, class, false);
    }

    fn next_sibling(&self, el: ElementId) -> Option<ElementId> {
        self.tree.lock().sibling(el, true)
    }

    fn prev_sibling(&self, el: ElementId) -> Option<ElementId> {
        self.tree.lock().sibling(el, false)
    }

    fn observe(
        &self,
        target: Scope,
        config: ObserveConfig,
        callback: MutationCallback,
    ) -> Result<ObserverId> {
        if let Scope::Element(id) = target
            && self.tree.lock().node(id).is_none()
        {
            return Err(DomError::UnknownElement(id));
        }
        let id = ObserverId(self.next_observer.fetch_add(1, Ordering::SeqCst));
        self.observers.lock().push(Observer {
            id,
            target,
            config,
            callback,
        });
        Ok(id)
    }

    fn disconnect(&self, id: ObserverId) -> bool {
        let mut observers = self.observers.lock();
        let before = observers.len();
        observers.retain(|o| o.id != id);
        observers.len() != before
    }
}

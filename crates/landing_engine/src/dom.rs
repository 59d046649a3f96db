//! Live document backing the sandbox.
//!
//! The tree is a `scraper::Html` and is serialized by html5ever. Element
//! serials and overlay state live in a side table keyed by `NodeId`; detached
//! subtrees drop out of both tables.

use std::collections::HashMap;

use ego_tree::{NodeId, NodeRef};
use scraper::node::{Node, Text};
use scraper::{ElementRef, Html};

use crate::overlay::Instrumentation;

pub(crate) const BODY_SERIAL: u64 = 0;

#[derive(Debug, Clone)]
pub(crate) struct ElementSlot {
    pub(crate) serial: u64,
    pub(crate) editable: bool,
    pub(crate) overlay: Instrumentation,
}

#[derive(Debug)]
pub(crate) struct Document {
    html: Html,
    body: NodeId,
    slots: HashMap<NodeId, ElementSlot>,
    index: HashMap<u64, NodeId>,
    next_serial: u64,
}

impl Document {
    /// Empty document; its root element plays the part of `<body>`.
    pub(crate) fn new() -> Self {
        let html = Html::parse_fragment("");
        let body = html.root_element().id();
        Self {
            html,
            body,
            slots: HashMap::new(),
            index: HashMap::new(),
            next_serial: BODY_SERIAL + 1,
        }
    }

    pub(crate) fn body(&self) -> NodeId {
        self.body
    }

    pub(crate) fn lookup(&self, serial: u64) -> Option<NodeId> {
        self.index.get(&serial).copied()
    }

    pub(crate) fn element_serials(&self) -> Vec<u64> {
        self.serials_below(self.body)
    }

    /// Serials of the elements strictly inside `id`, in document order.
    pub(crate) fn serials_below(&self, id: NodeId) -> Vec<u64> {
        self.slot_ids_below(id)
            .into_iter()
            .filter_map(|id| self.slots.get(&id).map(|slot| slot.serial))
            .collect()
    }

    pub(crate) fn slot(&self, id: NodeId) -> Option<&ElementSlot> {
        self.slots.get(&id)
    }

    pub(crate) fn slot_mut(&mut self, id: NodeId) -> Option<&mut ElementSlot> {
        self.slots.get_mut(&id)
    }

    pub(crate) fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.html.tree.get(id)?.value().as_element().map(|e| e.name())
    }

    /// Appends an empty `tag` element under `parent`.
    pub(crate) fn append_element(&mut self, parent: NodeId, tag: &str) -> Option<NodeId> {
        let serial = *self.append_html(parent, &format!("<{tag}></{tag}>")).first()?;
        self.lookup(serial)
    }

    pub(crate) fn append_text(&mut self, parent: NodeId, text: &str) -> Option<NodeId> {
        let node = Node::Text(Text { text: text.into() });
        Some(self.html.tree.get_mut(parent)?.append(node).id())
    }

    /// Parses `html` in body context and appends the result under `parent`.
    ///
    /// Returns the serials of the new elements in document order.
    pub(crate) fn append_html(&mut self, parent: NodeId, html: &str) -> Vec<u64> {
        let fragment = Html::parse_fragment(html);
        let mut added = Vec::new();
        self.copy_children(*fragment.root_element(), parent, &mut added);
        added
    }

    /// Detaches every child of `id`; their serials stop resolving.
    pub(crate) fn clear_children(&mut self, id: NodeId) {
        for dropped in self.slot_ids_below(id) {
            if let Some(slot) = self.slots.remove(&dropped) {
                self.index.remove(&slot.serial);
            }
        }
        let Some(node) = self.html.tree.get(id) else {
            return;
        };
        let children: Vec<NodeId> = node.children().map(|child| child.id()).collect();
        for child in children {
            if let Some(mut child) = self.html.tree.get_mut(child) {
                child.detach();
            }
        }
    }

    pub(crate) fn inner_html(&self, id: NodeId) -> String {
        self.element_ref(id)
            .map(|element| element.inner_html())
            .unwrap_or_default()
    }

    pub(crate) fn outer_html(&self, id: NodeId) -> String {
        self.element_ref(id)
            .map(|element| element.html())
            .unwrap_or_default()
    }

    fn element_ref(&self, id: NodeId) -> Option<ElementRef<'_>> {
        ElementRef::wrap(self.html.tree.get(id)?)
    }

    fn slot_ids_below(&self, id: NodeId) -> Vec<NodeId> {
        let Some(node) = self.html.tree.get(id) else {
            return Vec::new();
        };
        node.descendants()
            .skip(1)
            .map(|n| n.id())
            .filter(|id| self.slots.contains_key(id))
            .collect()
    }

    fn register(&mut self, id: NodeId) -> u64 {
        let serial = self.next_serial;
        self.next_serial += 1;
        self.slots.insert(
            id,
            ElementSlot {
                serial,
                editable: false,
                overlay: Instrumentation::default(),
            },
        );
        self.index.insert(serial, id);
        serial
    }

    fn copy_children(&mut self, source: NodeRef<'_, Node>, parent: NodeId, added: &mut Vec<u64>) {
        for child in source.children() {
            let value = child.value();
            if !(value.is_element() || value.is_text() || value.is_comment()) {
                continue;
            }
            let Some(mut parent_node) = self.html.tree.get_mut(parent) else {
                return;
            };
            let id = parent_node.append(value.clone()).id();
            if value.is_element() {
                added.push(self.register(id));
                self.copy_children(child, id, added);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(html: &str) -> String {
        let mut doc = Document::new();
        let body = doc.body();
        doc.append_html(body, html);
        doc.inner_html(body)
    }

    #[test]
    fn well_formed_markup_serializes_unchanged() {
        let html = r#"<section class="hero"><h1>Bakery</h1><p>Fresh <b>bread</b></p></section>"#;
        assert_eq!(roundtrip(html), html);
    }

    #[test]
    fn void_elements_have_no_end_tag() {
        assert_eq!(
            roundtrip(r#"<p>a<br>b<img src="x.png"></p>"#),
            r#"<p>a<br>b<img src="x.png"></p>"#
        );
    }

    #[test]
    fn text_and_attributes_are_escaped() {
        assert_eq!(
            roundtrip(r#"<p title="a &quot;b&quot;">1 &lt; 2 &amp; 3</p>"#),
            r#"<p title="a &quot;b&quot;">1 &lt; 2 &amp; 3</p>"#
        );
    }

    #[test]
    fn style_contents_stay_raw() {
        let html = "<style>a > b { color: red; }</style><p>x</p>";
        assert_eq!(roundtrip(html), html);
    }

    #[test]
    fn namespaced_svg_attributes_survive() {
        let html = r##"<svg><use xlink:href="#icon"></use></svg>"##;
        assert_eq!(roundtrip(html), html);
    }

    #[test]
    fn unclosed_tags_are_completed_by_the_parser() {
        assert_eq!(roundtrip("<div><p>partial"), "<div><p>partial</p></div>");
    }

    #[test]
    fn comments_are_kept() {
        assert_eq!(roundtrip("<!-- hero --><p>x</p>"), "<!-- hero --><p>x</p>");
    }

    #[test]
    fn serials_follow_document_order() {
        let mut doc = Document::new();
        let body = doc.body();
        let added = doc.append_html(body, "<div><p>a</p></div><span>b</span>");
        assert_eq!(added, vec![1, 2, 3]);
        assert_eq!(doc.element_serials(), vec![1, 2, 3]);
        let div = doc.lookup(1).unwrap();
        assert_eq!(doc.tag_name(div), Some("div"));
        assert_eq!(doc.slot(div).map(|slot| slot.serial), Some(1));
    }

    #[test]
    fn cleared_children_stop_resolving() {
        let mut doc = Document::new();
        let body = doc.body();
        doc.append_html(body, "<div><p>a</p></div>");
        let div = doc.lookup(1).unwrap();
        doc.clear_children(div);
        assert!(doc.lookup(2).is_none());
        assert!(doc.lookup(1).is_some());
        assert_eq!(doc.inner_html(body), "<div></div>");
    }

    #[test]
    fn text_nodes_are_escaped_on_output() {
        let mut doc = Document::new();
        let body = doc.body();
        let pre = doc.append_element(body, "pre").unwrap();
        doc.append_text(pre, "<b>&</b>");
        assert_eq!(doc.inner_html(body), "<pre>&lt;b&gt;&amp;&lt;/b&gt;</pre>");
    }
}

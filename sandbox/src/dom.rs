//! Document model: an arena of nodes addressed by generation-checked references.
//!
//! The preview surface replaces subtrees wholesale on every artifact update, so
//! anything holding on to a node (hover, selection, inspector) must be able to
//! tell that its node is gone. Every slot carries a generation counter that is
//! bumped when the slot is freed; a [`NodeRef`] whose generation no longer
//! matches is stale and every accessor treats it as absent.
//!
//! Text is stored exactly as it appeared in the source markup (entities
//! intact) so parse → serialize is lossless. Text written through
//! [`Document::set_text_content`] is escaped on the way in.

#[cfg(test)]
#[path = "dom_test.rs"]
mod dom_test;

use crate::html::{self, ParseMode};
use crate::style::InlineStyle;

/// Elements that never have children or an end tag.
pub const VOID_ELEMENTS: [&str; 14] =
    ["area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source", "track", "wbr"];

/// Weak, generation-checked handle to a node in a [`Document`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeRef {
    index: usize,
    generation: u32,
}

impl NodeRef {
    /// Arena slot of the node. Stable for the node's lifetime, reused afterwards.
    #[must_use]
    pub fn index(self) -> usize {
        self.index
    }
}

/// One attribute. `value == None` is a bare boolean attribute (`<input disabled>`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: Option<String>,
}

/// An element node. Tag and attribute names keep their source casing and are
/// compared ASCII-case-insensitively.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<Attribute>,
}

impl Element {
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into(), attrs: Vec::new() }
    }

    /// Whether this element has the given tag name.
    #[must_use]
    pub fn is(&self, tag: &str) -> bool {
        self.tag.eq_ignore_ascii_case(tag)
    }

    #[must_use]
    pub fn is_void(&self) -> bool {
        VOID_ELEMENTS.iter().any(|v| self.is(v))
    }

    /// Attribute value; boolean attributes read as `""`.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.value.as_deref().unwrap_or(""))
    }

    #[must_use]
    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|a| a.name.eq_ignore_ascii_case(name))
    }

    /// Set an attribute, keeping its position if it already exists.
    pub fn set_attr(&mut self, name: &str, value: &str) {
        if let Some(existing) = self
            .attrs
            .iter_mut()
            .find(|a| a.name.eq_ignore_ascii_case(name))
        {
            existing.value = Some(value.to_owned());
        } else {
            self.attrs.push(Attribute { name: name.to_owned(), value: Some(value.to_owned()) });
        }
    }

    /// Remove an attribute. Returns `true` if it was present.
    pub fn remove_attr(&mut self, name: &str) -> bool {
        let before = self.attrs.len();
        self.attrs.retain(|a| !a.name.eq_ignore_ascii_case(name));
        self.attrs.len() != before
    }
}

/// Payload of a node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeData {
    /// The single document root.
    Document,
    /// Raw declaration text between `<!` and `>`, e.g. `DOCTYPE html`.
    Doctype(String),
    Element(Element),
    /// Source text, entities not decoded.
    Text(String),
    Comment(String),
}

/// Errors from structural document operations.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// The node was removed, or its slot now holds another node.
    #[error("node reference is stale")]
    Stale,
    /// The operation needs an element.
    #[error("node is not an element")]
    NotElement,
    /// The insertion would create a cycle or put children under a leaf.
    #[error("invalid hierarchy for insertion")]
    Hierarchy,
}

#[derive(Clone, Debug)]
struct Node {
    data: NodeData,
    parent: Option<usize>,
    children: Vec<usize>,
}

#[derive(Clone, Debug)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Arena-backed document tree. Slot 0 is always the document root.
#[derive(Clone, Debug)]
pub struct Document {
    slots: Vec<Slot>,
    free: Vec<usize>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document holding only its root.
    #[must_use]
    pub fn new() -> Self {
        let root = Node { data: NodeData::Document, parent: None, children: Vec::new() };
        Self { slots: vec![Slot { generation: 0, node: Some(root) }], free: Vec::new() }
    }

    /// Parse a complete document (doctype, `<html>`, `<head>`, `<body>` kept).
    #[must_use]
    pub fn parse(markup: &str) -> Self {
        let mut doc = Self::new();
        html::parse_into(&mut doc, 0, markup, ParseMode::Document);
        doc
    }

    // --- Navigation ---

    #[must_use]
    pub fn root(&self) -> NodeRef {
        self.reference(0)
    }

    /// The first element child of the root (normally `<html>`).
    #[must_use]
    pub fn document_element(&self) -> Option<NodeRef> {
        self.children_at(0)
            .iter()
            .copied()
            .find(|i| matches!(self.data_at(*i), Some(NodeData::Element(_))))
            .map(|i| self.reference(i))
    }

    /// Whether the reference still points at a live node.
    #[must_use]
    pub fn is_alive(&self, node: NodeRef) -> bool {
        self.node(node).is_some()
    }

    /// Whether the node is live and reachable from the document root.
    #[must_use]
    pub fn is_attached(&self, node: NodeRef) -> bool {
        if !self.is_alive(node) {
            return false;
        }
        let mut cursor = Some(node.index);
        while let Some(index) = cursor {
            if index == 0 {
                return true;
            }
            cursor = self.at(index).and_then(|n| n.parent);
        }
        false
    }

    #[must_use]
    pub fn data(&self, node: NodeRef) -> Option<&NodeData> {
        self.node(node).map(|n| &n.data)
    }

    #[must_use]
    pub fn element(&self, node: NodeRef) -> Option<&Element> {
        match self.data(node) {
            Some(NodeData::Element(el)) => Some(el),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, node: NodeRef) -> Option<&mut Element> {
        match self.node_mut(node).map(|n| &mut n.data) {
            Some(NodeData::Element(el)) => Some(el),
            _ => None,
        }
    }

    #[must_use]
    pub fn tag(&self, node: NodeRef) -> Option<&str> {
        self.element(node).map(|el| el.tag.as_str())
    }

    #[must_use]
    pub fn parent(&self, node: NodeRef) -> Option<NodeRef> {
        self.node(node)
            .and_then(|n| n.parent)
            .map(|i| self.reference(i))
    }

    #[must_use]
    pub fn children(&self, node: NodeRef) -> Vec<NodeRef> {
        self.node(node)
            .map(|n| n.children.iter().map(|i| self.reference(*i)).collect())
            .unwrap_or_default()
    }

    /// Every node below `node` in document order, excluding `node` itself.
    #[must_use]
    pub fn descendants(&self, node: NodeRef) -> Vec<NodeRef> {
        let Some(start) = self.node(node) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let mut stack: Vec<usize> = start.children.iter().rev().copied().collect();
        while let Some(index) = stack.pop() {
            out.push(self.reference(index));
            stack.extend(self.children_at(index).iter().rev().copied());
        }
        out
    }

    /// First attached element whose `id` attribute equals `id`.
    #[must_use]
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeRef> {
        self.descendants(self.root())
            .into_iter()
            .find(|n| self.element(*n).and_then(|el| el.attr("id")) == Some(id))
    }

    /// Number of live nodes, root included.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.node.is_some()).count()
    }

    // --- Construction ---

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeRef {
        let index = self.alloc(NodeData::Element(Element::new(tag)), None);
        self.reference(index)
    }

    /// Create a detached text node. `text` is stored as markup, not escaped.
    pub fn create_text(&mut self, text: &str) -> NodeRef {
        let index = self.alloc(NodeData::Text(text.to_owned()), None);
        self.reference(index)
    }

    /// Move `child` (and its subtree) to the end of `parent`'s children.
    ///
    /// # Errors
    ///
    /// [`DomError::Stale`] for dead references, [`DomError::Hierarchy`] if
    /// `parent` cannot hold children or lies inside `child`.
    pub fn append_child(&mut self, parent: NodeRef, child: NodeRef) -> Result<(), DomError> {
        if !self.is_alive(parent) || !self.is_alive(child) {
            return Err(DomError::Stale);
        }
        if !matches!(self.data_at(parent.index), Some(NodeData::Document | NodeData::Element(_))) {
            return Err(DomError::Hierarchy);
        }
        if child.index == 0 || self.is_ancestor_or_self(child.index, parent.index) {
            return Err(DomError::Hierarchy);
        }
        self.unlink(child.index);
        if let Some(node) = self.at_mut(parent.index) {
            node.children.push(child.index);
        }
        if let Some(node) = self.at_mut(child.index) {
            node.parent = Some(parent.index);
        }
        Ok(())
    }

    /// Remove a node and free its whole subtree.
    ///
    /// # Errors
    ///
    /// [`DomError::Stale`] for dead references, [`DomError::Hierarchy`] for the root.
    pub fn remove(&mut self, node: NodeRef) -> Result<(), DomError> {
        if !self.is_alive(node) {
            return Err(DomError::Stale);
        }
        if node.index == 0 {
            return Err(DomError::Hierarchy);
        }
        self.unlink(node.index);
        self.free_subtree(node.index);
        Ok(())
    }

    /// Free every child subtree of `node`.
    ///
    /// # Errors
    ///
    /// [`DomError::Stale`] for dead references.
    pub fn clear_children(&mut self, node: NodeRef) -> Result<(), DomError> {
        let children = match self.node_mut(node) {
            Some(n) => std::mem::take(&mut n.children),
            None => return Err(DomError::Stale),
        };
        for child in children {
            self.free_subtree(child);
        }
        Ok(())
    }

    /// Replace the children of `node` with parsed markup, the way `innerHTML`
    /// does: document-level wrappers (`<html>`, `<head>`, `<body>`, doctype)
    /// are dropped and their contents kept.
    ///
    /// # Errors
    ///
    /// [`DomError::Stale`] for dead references, [`DomError::NotElement`] for
    /// non-element targets.
    pub fn set_inner_html(&mut self, node: NodeRef, markup: &str) -> Result<(), DomError> {
        if self.element(node).is_none() {
            return Err(if self.is_alive(node) { DomError::NotElement } else { DomError::Stale });
        }
        self.clear_children(node)?;
        html::parse_into(self, node.index, markup, ParseMode::Fragment);
        Ok(())
    }

    /// Replace the children of `node` with one text node holding `text`, escaped.
    ///
    /// # Errors
    ///
    /// [`DomError::Stale`] / [`DomError::NotElement`] as for [`Document::set_inner_html`].
    pub fn set_text_content(&mut self, node: NodeRef, text: &str) -> Result<(), DomError> {
        if self.element(node).is_none() {
            return Err(if self.is_alive(node) { DomError::NotElement } else { DomError::Stale });
        }
        self.clear_children(node)?;
        if !text.is_empty() {
            self.push_child(node.index, NodeData::Text(html::escape_text(text)));
        }
        Ok(())
    }

    // --- Serialization ---

    #[must_use]
    pub fn inner_html(&self, node: NodeRef) -> String {
        let mut out = String::new();
        if self.is_alive(node) {
            html::serialize_children(self, node.index, &mut out);
        }
        out
    }

    #[must_use]
    pub fn outer_html(&self, node: NodeRef) -> String {
        let mut out = String::new();
        if self.is_alive(node) {
            html::serialize_node(self, node.index, &mut out);
        }
        out
    }

    /// Concatenated text below `node`, as stored.
    #[must_use]
    pub fn text_content(&self, node: NodeRef) -> String {
        let mut out = String::new();
        if let Some(NodeData::Text(text)) = self.data(node) {
            out.push_str(text);
        }
        for d in self.descendants(node) {
            if let Some(NodeData::Text(text)) = self.data(d) {
                out.push_str(text);
            }
        }
        out
    }

    /// Deep copy of `node` as the sole child of a fresh document.
    #[must_use]
    pub fn clone_subtree(&self, node: NodeRef) -> Option<Document> {
        self.node(node)?;
        let mut copy = Document::new();
        let mut stack = vec![(node.index, 0_usize)];
        while let Some((src, dst_parent)) = stack.pop() {
            let Some(data) = self.data_at(src) else {
                continue;
            };
            let dst = copy.push_child(dst_parent, data.clone());
            stack.extend(self.children_at(src).iter().rev().map(|c| (*c, dst)));
        }
        Some(copy)
    }

    // --- Attributes, style, classes ---

    #[must_use]
    pub fn attr(&self, node: NodeRef, name: &str) -> Option<&str> {
        self.element(node).and_then(|el| el.attr(name))
    }

    /// # Errors
    ///
    /// [`DomError::Stale`] / [`DomError::NotElement`].
    pub fn set_attr(&mut self, node: NodeRef, name: &str, value: &str) -> Result<(), DomError> {
        self.element_mut_checked(node)?.set_attr(name, value);
        Ok(())
    }

    /// # Errors
    ///
    /// [`DomError::Stale`] / [`DomError::NotElement`].
    pub fn remove_attr(&mut self, node: NodeRef, name: &str) -> Result<bool, DomError> {
        Ok(self.element_mut_checked(node)?.remove_attr(name))
    }

    /// Parsed inline style of an element (empty when it has none).
    #[must_use]
    pub fn style(&self, node: NodeRef) -> InlineStyle {
        self.attr(node, "style")
            .map(InlineStyle::parse)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn style_property(&self, node: NodeRef, property: &str) -> Option<String> {
        self.style(node).get(property).map(str::to_owned)
    }

    /// Write one inline style property; an empty value removes it. The `style`
    /// attribute is dropped once no declarations remain.
    ///
    /// # Errors
    ///
    /// [`DomError::Stale`] / [`DomError::NotElement`].
    pub fn set_style_property(&mut self, node: NodeRef, property: &str, value: &str) -> Result<(), DomError> {
        let mut style = self.style(node);
        style.set(property, value);
        write_style(self.element_mut_checked(node)?, &style);
        Ok(())
    }

    /// Whitespace-separated class tokens of an element.
    #[must_use]
    pub fn class_list(&self, node: NodeRef) -> Vec<String> {
        self.attr(node, "class")
            .map(|raw| raw.split_whitespace().map(str::to_owned).collect())
            .unwrap_or_default()
    }

    /// Write the joined class list back to the element.
    ///
    /// # Errors
    ///
    /// [`DomError::Stale`] / [`DomError::NotElement`].
    pub fn set_class_list(&mut self, node: NodeRef, classes: &[String]) -> Result<(), DomError> {
        let el = self.element_mut_checked(node)?;
        if classes.is_empty() {
            el.remove_attr("class");
        } else {
            el.set_attr("class", &classes.join(" "));
        }
        Ok(())
    }

    // --- Crate-internal arena access (parser / serializer) ---

    pub(crate) fn data_at(&self, index: usize) -> Option<&NodeData> {
        self.at(index).map(|n| &n.data)
    }

    pub(crate) fn children_at(&self, index: usize) -> &[usize] {
        self.at(index).map_or(&[], |n| n.children.as_slice())
    }

    /// Append a new node under `parent`; adjacent text nodes are merged.
    pub(crate) fn push_child(&mut self, parent: usize, data: NodeData) -> usize {
        if let NodeData::Text(text) = &data {
            if let Some(last) = self.children_at(parent).last().copied() {
                if let Some(Node { data: NodeData::Text(existing), .. }) = self.at_mut(last) {
                    existing.push_str(text);
                    return last;
                }
            }
        }
        let index = self.alloc(data, Some(parent));
        if let Some(node) = self.at_mut(parent) {
            node.children.push(index);
        }
        index
    }

    // --- Private helpers ---

    fn reference(&self, index: usize) -> NodeRef {
        let generation = self.slots.get(index).map_or(0, |s| s.generation);
        NodeRef { index, generation }
    }

    fn at(&self, index: usize) -> Option<&Node> {
        self.slots.get(index).and_then(|s| s.node.as_ref())
    }

    fn at_mut(&mut self, index: usize) -> Option<&mut Node> {
        self.slots.get_mut(index).and_then(|s| s.node.as_mut())
    }

    fn node(&self, node: NodeRef) -> Option<&Node> {
        self.slots
            .get(node.index)
            .filter(|s| s.generation == node.generation)
            .and_then(|s| s.node.as_ref())
    }

    fn node_mut(&mut self, node: NodeRef) -> Option<&mut Node> {
        self.slots
            .get_mut(node.index)
            .filter(|s| s.generation == node.generation)
            .and_then(|s| s.node.as_mut())
    }

    fn element_mut_checked(&mut self, node: NodeRef) -> Result<&mut Element, DomError> {
        if !self.is_alive(node) {
            return Err(DomError::Stale);
        }
        self.element_mut(node).ok_or(DomError::NotElement)
    }

    fn alloc(&mut self, data: NodeData, parent: Option<usize>) -> usize {
        let node = Node { data, parent, children: Vec::new() };
        if let Some(index) = self.free.pop() {
            if let Some(slot) = self.slots.get_mut(index) {
                slot.node = Some(node);
                return index;
            }
        }
        self.slots.push(Slot { generation: 0, node: Some(node) });
        self.slots.len() - 1
    }

    fn unlink(&mut self, index: usize) {
        let Some(parent) = self.at(index).and_then(|n| n.parent) else {
            return;
        };
        if let Some(p) = self.at_mut(parent) {
            p.children.retain(|c| *c != index);
        }
        if let Some(n) = self.at_mut(index) {
            n.parent = None;
        }
    }

    fn free_subtree(&mut self, index: usize) {
        let mut stack = vec![index];
        while let Some(current) = stack.pop() {
            let Some(slot) = self.slots.get_mut(current) else {
                continue;
            };
            if let Some(node) = slot.node.take() {
                stack.extend(node.children);
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(current);
            }
        }
    }

    fn is_ancestor_or_self(&self, ancestor: usize, index: usize) -> bool {
        let mut cursor = Some(index);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.at(current).and_then(|n| n.parent);
        }
        false
    }
}

fn write_style(el: &mut Element, style: &InlineStyle) {
    if style.is_empty() {
        el.remove_attr("style");
    } else {
        el.set_attr("style", &style.to_attr());
    }
}

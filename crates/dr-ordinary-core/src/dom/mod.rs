//! Arena document model.
//!
//! A small DOM that the highlighter and side panel mutate in place. Nodes are
//! addressed by [`NodeId`] into a single arena owned by [`Document`]; removing a
//! node only detaches it, so ids stay valid for the lifetime of the document.

mod parser;
mod serialize;

pub use parser::*;
pub use serialize::*;

use thiserror::Error;

/// DOM mutation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    #[error("Node {0:?} does not exist")]
    UnknownNode(NodeId),

    #[error("Node {0:?} is not attached to a parent")]
    Detached(NodeId),

    #[error("Node {0:?} is not a text node")]
    NotText(NodeId),

    #[error("Node {0:?} cannot have children")]
    NotContainer(NodeId),

    #[error("Offset {offset} is not a valid split point in node {node:?}")]
    InvalidOffset { node: NodeId, offset: usize },

    #[error("Inserting {child:?} under {parent:?} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },
}

pub type DomResult<T> = Result<T, DomError>;

/// ID used to address nodes in the document arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// An element's tag and attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Lower-cased tag name
    pub tag: String,
    /// Attributes in source order
    pub attrs: Vec<(String, String)>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|classes| classes.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }
}

/// Node payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Document,
    Element(Element),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

/// A mutable document tree.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document containing only the root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                data: NodeData::Document,
            }],
        }
    }

    /// Parse HTML markup into a document.
    pub fn parse(html: &str) -> Self {
        HtmlParser.parse(html)
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    // =========================================================================
    // Node creation
    // =========================================================================

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeData::Element(Element::new(tag)))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Text(text.into()))
    }

    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Comment(text.into()))
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            data,
        });
        id
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn data(&self, node: NodeId) -> Option<&NodeData> {
        self.nodes.get(node.0).map(|n| &n.data)
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0).and_then(|n| n.parent)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn element(&self, node: NodeId) -> Option<&Element> {
        match self.data(node) {
            Some(NodeData::Element(element)) => Some(element),
            _ => None,
        }
    }

    pub fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|e| e.tag.as_str())
    }

    pub fn text(&self, node: NodeId) -> Option<&str> {
        match self.data(node) {
            Some(NodeData::Text(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node).and_then(|e| e.attr(name))
    }

    /// Set or overwrite an attribute. No-op on non-elements.
    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(Node {
            data: NodeData::Element(element),
            ..
        }) = self.nodes.get_mut(node.0)
        {
            match element.attrs.iter_mut().find(|(key, _)| key == name) {
                Some((_, existing)) => *existing = value.to_owned(),
                None => element.attrs.push((name.to_owned(), value.to_owned())),
            }
        }
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) {
        let Some(element) = self.element(node) else {
            return;
        };
        if element.has_class(class) {
            return;
        }
        let joined = match element.attr("class") {
            Some(existing) if !existing.trim().is_empty() => format!("{existing} {class}"),
            _ => class.to_owned(),
        };
        self.set_attr(node, "class", &joined);
    }

    pub fn remove_class(&mut self, node: NodeId, class: &str) {
        let Some(existing) = self.attr(node, "class") else {
            return;
        };
        let kept = existing
            .split_whitespace()
            .filter(|c| *c != class)
            .collect::<Vec<_>>()
            .join(" ");
        self.set_attr(node, "class", &kept);
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.element(node).map(|e| e.has_class(class)).unwrap_or(false)
    }

    /// True when the node is reachable from the document root.
    pub fn is_attached(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == self.root() {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// True when `node` is `ancestor` or one of its descendants.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Nearest inclusive ancestor element matching `predicate`.
    pub fn closest<F>(&self, node: NodeId, predicate: F) -> Option<NodeId>
    where
        F: Fn(&Element) -> bool,
    {
        let mut current = Some(node);
        while let Some(id) = current {
            if self.element(id).map(&predicate).unwrap_or(false) {
                return Some(id);
            }
            current = self.parent(id);
        }
        None
    }

    /// All nodes under `node` (excluding it) in document order.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// First element in document order with the given tag.
    pub fn find_element(&self, tag: &str) -> Option<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .find(|id| self.tag_name(*id) == Some(tag))
    }

    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .find(|node| self.attr(*node, "id") == Some(id))
    }

    /// The `<body>` element, or the root for fragments without one.
    pub fn body(&self) -> NodeId {
        self.find_element("body").unwrap_or_else(|| self.root())
    }

    /// The `<head>` element if present.
    pub fn head(&self) -> Option<NodeId> {
        self.find_element("head")
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, node: NodeId) -> String {
        if let Some(text) = self.text(node) {
            return text.to_owned();
        }
        self.descendants(node)
            .into_iter()
            .filter_map(|id| self.text(id))
            .collect()
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    fn ensure_exists(&self, node: NodeId) -> DomResult<()> {
        if node.0 < self.nodes.len() {
            Ok(())
        } else {
            Err(DomError::UnknownNode(node))
        }
    }

    fn ensure_container(&self, node: NodeId) -> DomResult<()> {
        match self.data(node) {
            Some(NodeData::Document) | Some(NodeData::Element(_)) => Ok(()),
            Some(_) => Err(DomError::NotContainer(node)),
            None => Err(DomError::UnknownNode(node)),
        }
    }

    /// Detach a node from its parent. Detached nodes keep their subtree.
    pub fn detach(&mut self, node: NodeId) -> DomResult<()> {
        self.ensure_exists(node)?;
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != node);
        }
        Ok(())
    }

    fn prepare_insert(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.ensure_container(parent)?;
        self.ensure_exists(child)?;
        if self.contains(child, parent) {
            return Err(DomError::Cycle { parent, child });
        }
        self.detach(child)
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.prepare_insert(parent, child)?;
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        Ok(())
    }

    /// Insert `new` as the next sibling of `reference`.
    pub fn insert_after(&mut self, reference: NodeId, new: NodeId) -> DomResult<()> {
        let parent = self.parent(reference).ok_or(DomError::Detached(reference))?;
        self.prepare_insert(parent, new)?;
        let position = self.position_in_parent(parent, reference)?;
        self.nodes[new.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(position + 1, new);
        Ok(())
    }

    /// Put `new` in the place of `old`; `old` becomes detached.
    pub fn replace(&mut self, old: NodeId, new: NodeId) -> DomResult<()> {
        let parent = self.parent(old).ok_or(DomError::Detached(old))?;
        self.prepare_insert(parent, new)?;
        let position = self.position_in_parent(parent, old)?;
        self.nodes[parent.0].children[position] = new;
        self.nodes[new.0].parent = Some(parent);
        self.nodes[old.0].parent = None;
        Ok(())
    }

    /// Detach every child of `node`.
    pub fn clear_children(&mut self, node: NodeId) -> DomResult<()> {
        self.ensure_exists(node)?;
        let children = std::mem::take(&mut self.nodes[node.0].children);
        for child in children {
            self.nodes[child.0].parent = None;
        }
        Ok(())
    }

    fn position_in_parent(&self, parent: NodeId, child: NodeId) -> DomResult<usize> {
        self.children(parent)
            .iter()
            .position(|c| *c == child)
            .ok_or(DomError::Detached(child))
    }

    /// Split an attached text node at a byte offset.
    ///
    /// The node keeps `[..offset]`; a new sibling inserted directly after it
    /// receives `[offset..]` and is returned.
    pub fn split_text(&mut self, node: NodeId, offset: usize) -> DomResult<NodeId> {
        let text = self.text(node).ok_or(DomError::NotText(node))?;
        if offset > text.len() || !text.is_char_boundary(offset) {
            return Err(DomError::InvalidOffset { node, offset });
        }
        if self.parent(node).is_none() {
            return Err(DomError::Detached(node));
        }

        let tail = text[offset..].to_owned();
        if let NodeData::Text(text) = &mut self.nodes[node.0].data {
            text.truncate(offset);
        }
        let tail_node = self.create_text(tail);
        self.insert_after(node, tail_node)?;
        Ok(tail_node)
    }

    /// Replace an element's children with a single text node.
    pub fn set_text_content(&mut self, node: NodeId, text: &str) -> DomResult<()> {
        self.ensure_container(node)?;
        self.clear_children(node)?;
        let text_node = self.create_text(text);
        self.append_child(node, text_node)
    }
}

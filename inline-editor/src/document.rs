//! Document surface the editor reads from and splices into.
//!
//! The rendering layer is an external collaborator; the editor only needs the
//! narrow set of operations in [`DocumentSurface`]. [`Document`] is an
//! arena-backed implementation used by tests and headless hosts.
//!
//! Invariants:
//! - Node ids are never reused; a removed node keeps its id and contents but
//!   has no parent until it is spliced back in.
//! - A node has at most one parent.
//! - `class_name` is the raw, space-separated class attribute.

/// Stable identity of a node within one document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Rendered size of an element, in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
    #[error("node {0} is not attached to a parent")]
    Detached(NodeId),
    #[error("node {0} is not an element")]
    NotAnElement(NodeId),
    #[error("node {new} is already attached elsewhere")]
    AlreadyAttached { new: NodeId },
}

/// Operations the editor needs from the document it edits.
pub trait DocumentSurface {
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Lowercase tag name, `None` for text nodes and unknown ids.
    fn tag(&self, node: NodeId) -> Option<&str>;

    fn class_name(&self, node: NodeId) -> Option<&str>;

    /// Concatenated text of the node and all its descendants.
    fn text_content(&self, node: NodeId) -> String;

    fn dimensions(&self, node: NodeId) -> Dimensions;

    /// Create a detached element.
    fn create_element(&mut self, tag: &str, class_name: &str) -> NodeId;

    fn set_dimensions(&mut self, node: NodeId, dims: Dimensions) -> Result<(), DocumentError>;

    fn set_class_name(&mut self, node: NodeId, class_name: &str) -> Result<(), DocumentError>;

    /// Replace all children of `node` with a single text node.
    fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), DocumentError>;

    fn append_text(&mut self, node: NodeId, text: &str) -> Result<(), DocumentError>;

    fn clear_children(&mut self, node: NodeId) -> Result<(), DocumentError>;

    /// Put detached `new` at `old`'s position; `old` becomes detached.
    fn replace_node(&mut self, old: NodeId, new: NodeId) -> Result<(), DocumentError>;

    /// Whether `node` is reachable from the document root.
    fn is_attached(&self, node: NodeId) -> bool;
}

#[derive(Debug, Clone)]
enum NodeKind {
    Element {
        tag: String,
        class_name: String,
        dims: Dimensions,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// In-memory document tree.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// A document with a single `body` root element.
    pub fn new() -> Self {
        let root = Node {
            kind: NodeKind::Element {
                tag: "body".to_string(),
                class_name: String::new(),
                dims: Dimensions::default(),
            },
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.node(node)
            .map(|n| n.children.as_slice())
            .unwrap_or_default()
    }

    /// Create an element and append it to `parent`.
    pub fn append_element(
        &mut self,
        parent: NodeId,
        tag: &str,
        class_name: &str,
    ) -> Result<NodeId, DocumentError> {
        self.element_check(parent)?;
        let id = self.create_element(tag, class_name);
        self.attach(parent, id);
        Ok(id)
    }

    /// Create a text node and append it to `parent`.
    pub fn append_text_node(&mut self, parent: NodeId, text: &str) -> Result<NodeId, DocumentError> {
        self.element_check(parent)?;
        let id = self.push(NodeKind::Text(text.to_string()));
        self.attach(parent, id);
        Ok(id)
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize)
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, DocumentError> {
        self.nodes
            .get_mut(id.0 as usize)
            .ok_or(DocumentError::UnknownNode(id))
    }

    fn element_check(&self, id: NodeId) -> Result<(), DocumentError> {
        match self.node(id) {
            Some(Node {
                kind: NodeKind::Element { .. },
                ..
            }) => Ok(()),
            Some(_) => Err(DocumentError::NotAnElement(id)),
            None => Err(DocumentError::UnknownNode(id)),
        }
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn attach(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.0 as usize].parent = Some(parent);
        self.nodes[parent.0 as usize].children.push(child);
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.node(id) else {
            return;
        };
        match &node.kind {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Element { .. } => {
                for child in &node.children {
                    self.collect_text(*child, out);
                }
            }
        }
    }

    fn detach_children(&mut self, id: NodeId) -> Result<(), DocumentError> {
        self.element_check(id)?;
        let children = std::mem::take(&mut self.node_mut(id)?.children);
        for child in children {
            self.nodes[child.0 as usize].parent = None;
        }
        Ok(())
    }
}

impl DocumentSurface for Document {
    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).and_then(|n| n.parent)
    }

    fn tag(&self, node: NodeId) -> Option<&str> {
        match &self.node(node)?.kind {
            NodeKind::Element { tag, .. } => Some(tag.as_str()),
            NodeKind::Text(_) => None,
        }
    }

    fn class_name(&self, node: NodeId) -> Option<&str> {
        match &self.node(node)?.kind {
            NodeKind::Element { class_name, .. } => Some(class_name.as_str()),
            NodeKind::Text(_) => None,
        }
    }

    fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn dimensions(&self, node: NodeId) -> Dimensions {
        match self.node(node).map(|n| &n.kind) {
            Some(NodeKind::Element { dims, .. }) => *dims,
            _ => Dimensions::default(),
        }
    }

    fn create_element(&mut self, tag: &str, class_name: &str) -> NodeId {
        self.push(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
            class_name: class_name.to_string(),
            dims: Dimensions::default(),
        })
    }

    fn set_dimensions(&mut self, node: NodeId, new_dims: Dimensions) -> Result<(), DocumentError> {
        match &mut self.node_mut(node)?.kind {
            NodeKind::Element { dims, .. } => {
                *dims = new_dims;
                Ok(())
            }
            NodeKind::Text(_) => Err(DocumentError::NotAnElement(node)),
        }
    }

    fn set_class_name(&mut self, node: NodeId, new_class: &str) -> Result<(), DocumentError> {
        match &mut self.node_mut(node)?.kind {
            NodeKind::Element { class_name, .. } => {
                *class_name = new_class.to_string();
                Ok(())
            }
            NodeKind::Text(_) => Err(DocumentError::NotAnElement(node)),
        }
    }

    fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), DocumentError> {
        self.detach_children(node)?;
        self.append_text_node(node, text)?;
        Ok(())
    }

    fn append_text(&mut self, node: NodeId, text: &str) -> Result<(), DocumentError> {
        self.append_text_node(node, text)?;
        Ok(())
    }

    fn clear_children(&mut self, node: NodeId) -> Result<(), DocumentError> {
        self.detach_children(node)
    }

    fn replace_node(&mut self, old: NodeId, new: NodeId) -> Result<(), DocumentError> {
        let parent = self
            .node(old)
            .ok_or(DocumentError::UnknownNode(old))?
            .parent
            .ok_or(DocumentError::Detached(old))?;
        let new_node = self.node(new).ok_or(DocumentError::UnknownNode(new))?;
        if new_node.parent.is_some() || new == self.root {
            return Err(DocumentError::AlreadyAttached { new });
        }
        // `new` must not be an ancestor of `old`
        let mut ancestor = Some(parent);
        while let Some(node) = ancestor {
            if node == new {
                return Err(DocumentError::AlreadyAttached { new });
            }
            ancestor = self.parent(node);
        }

        let siblings = &mut self.node_mut(parent)?.children;
        let Some(position) = siblings.iter().position(|id| *id == old) else {
            return Err(DocumentError::Detached(old));
        };
        siblings[position] = new;
        self.nodes[new.0 as usize].parent = Some(parent);
        self.nodes[old.0 as usize].parent = None;
        Ok(())
    }

    fn is_attached(&self, node: NodeId) -> bool {
        let mut current = node;
        loop {
            if current == self.root {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_with_cell(doc: &mut Document, text: &str) -> (NodeId, NodeId) {
        let root = doc.root();
        let row = doc.append_element(root, "tr", "oddrow").unwrap();
        let cell = doc.append_element(row, "div", "editable attr-displayName").unwrap();
        doc.append_text_node(cell, text).unwrap();
        (row, cell)
    }

    #[test]
    fn test_text_content_concatenates_descendants() {
        let mut doc = Document::new();
        let (row, cell) = row_with_cell(&mut doc, "Alice");
        let other = doc.append_element(row, "span", "").unwrap();
        doc.append_text_node(other, " Smith").unwrap();

        assert_eq!(doc.text_content(cell), "Alice");
        assert_eq!(doc.text_content(row), "Alice Smith");
    }

    #[test]
    fn test_replace_node_keeps_position() {
        let mut doc = Document::new();
        let (row, cell) = row_with_cell(&mut doc, "Alice");
        let after = doc.append_element(row, "span", "").unwrap();

        let replacement = doc.create_element("textarea", "inline-editor");
        doc.replace_node(cell, replacement).unwrap();

        assert_eq!(doc.children(row), &[replacement, after]);
        assert_eq!(doc.parent(replacement), Some(row));
        assert_eq!(doc.parent(cell), None);
        assert!(!doc.is_attached(cell));
        assert!(doc.is_attached(replacement));
        // Detached nodes keep their content
        assert_eq!(doc.text_content(cell), "Alice");
    }

    #[test]
    fn test_replace_rejects_detached_and_attached_nodes() {
        let mut doc = Document::new();
        let (_row, cell) = row_with_cell(&mut doc, "Alice");
        let loose = doc.create_element("span", "");
        let other_loose = doc.create_element("span", "");

        assert_eq!(
            doc.replace_node(loose, other_loose),
            Err(DocumentError::Detached(loose))
        );
        assert_eq!(
            doc.replace_node(cell, doc.root()),
            Err(DocumentError::AlreadyAttached { new: doc.root() })
        );
        assert_eq!(
            doc.replace_node(NodeId(999), loose),
            Err(DocumentError::UnknownNode(NodeId(999)))
        );

        // A detached node cannot take the place of one of its own descendants
        let wrapper = doc.create_element("div", "");
        let inner = doc.append_element(wrapper, "span", "").unwrap();
        doc.append_text_node(inner, "nested").unwrap();
        assert_eq!(
            doc.replace_node(inner, wrapper),
            Err(DocumentError::AlreadyAttached { new: wrapper })
        );
        assert_eq!(doc.parent(wrapper), None);
        assert_eq!(doc.parent(inner), Some(wrapper));
        assert!(!doc.is_attached(wrapper));
        assert_eq!(doc.text_content(wrapper), "nested");
    }

    #[test]
    fn test_set_text_replaces_children() {
        let mut doc = Document::new();
        let (_row, cell) = row_with_cell(&mut doc, "Alice");
        doc.append_text(cell, " and Bob").unwrap();
        assert_eq!(doc.text_content(cell), "Alice and Bob");

        doc.set_text(cell, "Carol").unwrap();
        assert_eq!(doc.text_content(cell), "Carol");
        assert_eq!(doc.children(cell).len(), 1);

        doc.clear_children(cell).unwrap();
        assert_eq!(doc.text_content(cell), "");
    }

    #[test]
    fn test_text_nodes_are_not_elements() {
        let mut doc = Document::new();
        let (_row, cell) = row_with_cell(&mut doc, "Alice");
        let text = doc.children(cell)[0];

        assert_eq!(doc.tag(text), None);
        assert_eq!(doc.class_name(text), None);
        assert_eq!(
            doc.set_class_name(text, "x"),
            Err(DocumentError::NotAnElement(text))
        );
        assert_eq!(
            doc.append_text_node(text, "x"),
            Err(DocumentError::NotAnElement(text))
        );
    }
}

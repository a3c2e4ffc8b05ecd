//! Document node tree
//!
//! This module defines the explicit tagged representation of an XML
//! fragment produced by item conversion and consumed by the serializer.
//! It replaces any implicit map-of-maps typing: scalars, repeated
//! elements and attributed elements are distinct variants.

use indexmap::IndexMap;

/// Ordered attribute map (name → already-formatted value)
pub type AttributeMap = IndexMap<String, String>;

/// Body of an element node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeBody {
    /// No content, serialized as an empty element
    Empty,
    /// Text content
    Text(String),
    /// Ordered child nodes
    Children(Vec<DocumentNode>),
}

/// One node of a document tree
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentNode {
    /// Bare text
    Scalar(String),
    /// Ordered sequence of sibling nodes
    List(Vec<DocumentNode>),
    /// Element with optional namespace prefix, attributes and body
    Element {
        /// Local element name
        name: String,
        /// Namespace prefix (`image`, `video`, ...), None for the
        /// default sitemap namespace
        namespace: Option<String>,
        /// Ordered attributes
        attributes: AttributeMap,
        /// Element content
        body: NodeBody,
    },
}

impl DocumentNode {
    /// Create an empty element in the default namespace
    pub fn element(name: impl Into<String>) -> Self {
        DocumentNode::Element {
            name: name.into(),
            namespace: None,
            attributes: AttributeMap::new(),
            body: NodeBody::Empty,
        }
    }

    /// Create an empty element with a namespace prefix
    pub fn namespaced(prefix: impl Into<String>, name: impl Into<String>) -> Self {
        DocumentNode::Element {
            name: name.into(),
            namespace: Some(prefix.into()),
            attributes: AttributeMap::new(),
            body: NodeBody::Empty,
        }
    }

    /// Create an element holding only text
    pub fn text_element(name: impl Into<String>, text: impl Into<String>) -> Self {
        DocumentNode::Element {
            name: name.into(),
            namespace: None,
            attributes: AttributeMap::new(),
            body: NodeBody::Text(text.into()),
        }
    }

    /// Set the text body
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        if let DocumentNode::Element { body, .. } = &mut self {
            *body = NodeBody::Text(text.into());
        }
        self
    }

    /// Add an attribute (element variants only)
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let DocumentNode::Element { attributes, .. } = &mut self {
            attributes.insert(name.into(), value.into());
        }
        self
    }

    /// Append a child node, converting the body to children as needed
    pub fn with_child(mut self, child: DocumentNode) -> Self {
        self.push_child(child);
        self
    }

    /// Append a child node in place
    pub fn push_child(&mut self, child: DocumentNode) {
        if let DocumentNode::Element { body, .. } = self {
            match body {
                NodeBody::Children(children) => children.push(child),
                NodeBody::Empty => *body = NodeBody::Children(vec![child]),
                NodeBody::Text(text) => {
                    let text = std::mem::take(text);
                    *body = NodeBody::Children(vec![DocumentNode::Scalar(text), child]);
                }
            }
        }
    }

    /// Element name, if this is an element node
    pub fn name(&self) -> Option<&str> {
        match self {
            DocumentNode::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Namespace prefix, if this is a namespaced element
    pub fn namespace(&self) -> Option<&str> {
        match self {
            DocumentNode::Element { namespace, .. } => namespace.as_deref(),
            _ => None,
        }
    }

    /// Whether this node serializes to nothing at all
    pub fn is_empty(&self) -> bool {
        match self {
            DocumentNode::Scalar(text) => text.is_empty(),
            DocumentNode::List(items) => items.iter().all(DocumentNode::is_empty),
            DocumentNode::Element { .. } => false,
        }
    }
}

//! Item / schema model
//!
//! Each item type declares its fields once in a static schema table and
//! instantiates them into a [`FieldSet`] on construction. The uniform
//! accessor contract (`add` appends for arrays and overwrites otherwise,
//! `set` always overwrites, `get` resolves) goes through field names;
//! unknown names are inert and report `false`.

mod extensions;
mod url_item;

pub use extensions::{
    AlternateLink, Extension, ImageItem, MobileItem, NewsItem, VideoItem,
};
pub use url_item::{ExtensionSet, UrlItem};

use crate::document::{DocumentNode, NodeBody};
use crate::error::Result;
use crate::fields::{FieldSchema, Resolved, ResolveContext, TypedField, Value};
use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;

/// A vendor extension namespace: prefix and URI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Namespace {
    /// Prefix written as `xmlns:<prefix>` and on every element
    pub prefix: &'static str,
    /// Namespace URI
    pub uri: &'static str,
}

/// Google image sitemap namespace
pub static IMAGE: Namespace = Namespace {
    prefix: "image",
    uri: crate::IMAGE_NAMESPACE,
};

/// Google video sitemap namespace
pub static VIDEO: Namespace = Namespace {
    prefix: "video",
    uri: crate::VIDEO_NAMESPACE,
};

/// Google news sitemap namespace
pub static NEWS: Namespace = Namespace {
    prefix: "news",
    uri: crate::NEWS_NAMESPACE,
};

/// Google mobile sitemap namespace
pub static MOBILE: Namespace = Namespace {
    prefix: "mobile",
    uri: crate::MOBILE_NAMESPACE,
};

/// XHTML namespace for alternate-language links
pub static XHTML: Namespace = Namespace {
    prefix: "xhtml",
    uri: crate::XHTML_NAMESPACE,
};

/// Concrete field holders instantiated from a static schema table
#[derive(Debug, Clone)]
pub struct FieldSet {
    fields: IndexMap<&'static str, TypedField>,
}

impl FieldSet {
    /// Instantiate holders for every schema in the table
    pub fn from_schema(schema: &'static [FieldSchema]) -> Self {
        let mut fields = IndexMap::with_capacity(schema.len());
        for field_schema in schema {
            fields.insert(field_schema.name, TypedField::new(field_schema));
        }
        Self { fields }
    }

    /// Overwrite a field. Unknown names are inert and return `false`.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<bool> {
        match self.fields.get_mut(name) {
            Some(field) => {
                field.set(value.into())?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Overwrite a field together with attribute values
    pub fn set_with_attrs(
        &mut self,
        name: &str,
        value: impl Into<Value>,
        attrs: &[(&str, Value)],
    ) -> Result<bool> {
        match self.fields.get_mut(name) {
            Some(field) => {
                field.set_with_attrs(value.into(), attrs)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Append for array fields, overwrite otherwise
    pub fn add(&mut self, name: &str, value: impl Into<Value>) -> Result<bool> {
        match self.fields.get_mut(name) {
            Some(field) => {
                field.add(value.into())?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Append with attribute values
    pub fn add_with_attrs(
        &mut self,
        name: &str,
        value: impl Into<Value>,
        attrs: &[(&str, Value)],
    ) -> Result<bool> {
        match self.fields.get_mut(name) {
            Some(field) => {
                field.add_with_attrs(value.into(), attrs)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Resolve a field's value. Unknown names resolve to `None`.
    pub fn get(&self, name: &str, ctx: &ResolveContext) -> Result<Option<Resolved>> {
        match self.fields.get(name) {
            Some(field) => field.resolve(ctx),
            None => Ok(None),
        }
    }

    /// The stored date of a DateTime field, if set
    pub fn datetime(&self, name: &str) -> Option<DateTime<FixedOffset>> {
        self.fields.get(name).and_then(TypedField::datetime_value)
    }

    /// Convert every populated field into child nodes, in schema order.
    ///
    /// Empty fields are omitted entirely; a plain list becomes repeated
    /// children of the same name; an attributed value becomes an element
    /// carrying its attribute set.
    pub fn to_children(
        &self,
        namespace: Option<&Namespace>,
        ctx: &ResolveContext,
    ) -> Result<Vec<DocumentNode>> {
        let mut children = Vec::new();
        for (name, field) in &self.fields {
            let Some(resolved) = field.resolve(ctx)? else {
                continue;
            };
            append_nodes(&mut children, name, namespace, resolved);
        }
        Ok(children)
    }
}

/// Turn one resolved value into document nodes under the field name
fn append_nodes(
    out: &mut Vec<DocumentNode>,
    name: &str,
    namespace: Option<&Namespace>,
    resolved: Resolved,
) {
    match resolved {
        Resolved::Scalar(text) => out.push(element(name, namespace, NodeBody::Text(text))),
        Resolved::Attributed { value, attrs } => {
            let mut node = element(name, namespace, NodeBody::Text(value));
            if let DocumentNode::Element { attributes, .. } = &mut node {
                *attributes = attrs;
            }
            out.push(node);
        }
        Resolved::List(items) => {
            for item in items {
                append_nodes(out, name, namespace, item);
            }
        }
    }
}

fn element(name: &str, namespace: Option<&Namespace>, body: NodeBody) -> DocumentNode {
    DocumentNode::Element {
        name: name.to_string(),
        namespace: namespace.map(|ns| ns.prefix.to_string()),
        attributes: Default::default(),
        body,
    }
}

/// An entity that renders as one element of a sitemap URL entry
pub trait SitemapItem {
    /// Element name (`url`, `image`, `video`, ...)
    fn element_name(&self) -> &'static str;

    /// Extension namespace, `None` for the default sitemap namespace
    fn namespace(&self) -> Option<&'static Namespace>;

    /// The item's field holders
    fn field_set(&self) -> &FieldSet;

    /// Convert populated fields into the item's document node.
    ///
    /// The default covers flat items; items with nested structure
    /// override it.
    fn to_document(&self, ctx: &ResolveContext) -> Result<DocumentNode> {
        let children = self.field_set().to_children(self.namespace(), ctx)?;
        let body = if children.is_empty() {
            NodeBody::Empty
        } else {
            NodeBody::Children(children)
        };
        Ok(DocumentNode::Element {
            name: self.element_name().to_string(),
            namespace: self.namespace().map(|ns| ns.prefix.to_string()),
            attributes: Default::default(),
            body,
        })
    }
}

//! The `<url>` entry item

use super::{Extension, FieldSet, Namespace, SitemapItem};
use crate::document::{DocumentNode, NodeBody};
use crate::error::Result;
use crate::fields::{FieldKind, FieldSchema, ResolveContext, Value};
use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;

static URL_SCHEMA: Lazy<Vec<FieldSchema>> = Lazy::new(|| {
    vec![
        FieldSchema::new("loc", FieldKind::Url).required(),
        FieldSchema::new("lastmod", FieldKind::DateTime),
        FieldSchema::new("changefreq", FieldKind::Str).with_allowed(&[
            "always", "hourly", "daily", "weekly", "monthly", "yearly", "never",
        ]),
        FieldSchema::new("priority", FieldKind::Float)
            .with_min_value(Decimal::ZERO)
            .with_max_value(Decimal::ONE)
            .with_precision(1),
    ]
});

/// Per-item ordered map of namespace prefix → extension items
#[derive(Debug, Clone, Default)]
pub struct ExtensionSet {
    by_namespace: IndexMap<&'static str, Vec<Extension>>,
}

impl ExtensionSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an extension under its namespace
    pub fn push(&mut self, extension: Extension) {
        self.by_namespace
            .entry(extension.namespace().prefix)
            .or_default()
            .push(extension);
    }

    /// Namespaces present, in insertion order
    pub fn namespaces(&self) -> impl Iterator<Item = &'static Namespace> + '_ {
        self.by_namespace
            .values()
            .filter_map(|extensions| extensions.first())
            .map(Extension::namespace)
    }

    /// All extensions in namespace insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Extension> {
        self.by_namespace.values().flatten()
    }

    /// Whether no extension has been attached
    pub fn is_empty(&self) -> bool {
        self.by_namespace.is_empty()
    }
}

/// One sitemap URL entry: the protocol fields plus attached extensions
#[derive(Debug, Clone)]
pub struct UrlItem {
    fields: FieldSet,
    extensions: ExtensionSet,
}

impl Default for UrlItem {
    fn default() -> Self {
        Self::new()
    }
}

impl UrlItem {
    /// Create an empty URL entry
    pub fn new() -> Self {
        Self {
            fields: FieldSet::from_schema(&URL_SCHEMA),
            extensions: ExtensionSet::new(),
        }
    }

    /// Overwrite a field; unknown names are inert
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<bool> {
        self.fields.set(name, value)
    }

    /// Append for array fields, overwrite otherwise
    pub fn add(&mut self, name: &str, value: impl Into<Value>) -> Result<bool> {
        self.fields.add(name, value)
    }

    /// Attach an extension item
    pub fn add_extension(&mut self, extension: Extension) {
        self.extensions.push(extension);
    }

    /// The attached extensions
    pub fn extensions(&self) -> &ExtensionSet {
        &self.extensions
    }

    /// The entry's last-modified date, if one survived validation
    pub fn lastmod(&self) -> Option<DateTime<FixedOffset>> {
        self.fields.datetime("lastmod")
    }
}

impl SitemapItem for UrlItem {
    fn element_name(&self) -> &'static str {
        "url"
    }

    fn namespace(&self) -> Option<&'static Namespace> {
        None
    }

    fn field_set(&self) -> &FieldSet {
        &self.fields
    }

    fn to_document(&self, ctx: &ResolveContext) -> Result<DocumentNode> {
        let mut children = self.fields.to_children(None, ctx)?;
        for extension in self.extensions.iter() {
            children.push(extension.to_document(ctx)?);
        }
        Ok(DocumentNode::Element {
            name: "url".to_string(),
            namespace: None,
            attributes: Default::default(),
            body: NodeBody::Children(children),
        })
    }
}

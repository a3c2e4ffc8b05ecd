//! Vendor extension items
//!
//! Each extension renders as a namespaced sub-document attached to a URL
//! entry: Google image/video/news/mobile vocabularies plus xhtml
//! alternate-language links.

use super::{FieldSet, Namespace, SitemapItem, IMAGE, MOBILE, NEWS, VIDEO, XHTML};
use crate::document::DocumentNode;
use crate::error::Result;
use crate::fields::{FieldKind, FieldSchema, Resolved, ResolveContext, Value};
use once_cell::sync::Lazy;
use rust_decimal::Decimal;

static IMAGE_SCHEMA: Lazy<Vec<FieldSchema>> = Lazy::new(|| {
    vec![
        FieldSchema::new("loc", FieldKind::Url).required(),
        FieldSchema::new("caption", FieldKind::Str),
        FieldSchema::new("geo_location", FieldKind::Str),
        FieldSchema::new("title", FieldKind::Str),
        FieldSchema::new("license", FieldKind::ExternalUrl),
    ]
});

static VIDEO_SCHEMA: Lazy<Vec<FieldSchema>> = Lazy::new(|| {
    vec![
        FieldSchema::new("thumbnail_loc", FieldKind::Url).required(),
        FieldSchema::new("title", FieldKind::Str).required().with_max_length(100),
        FieldSchema::new("description", FieldKind::Str)
            .required()
            .with_max_length(2048),
        FieldSchema::new("content_loc", FieldKind::Url),
        FieldSchema::new("player_loc", FieldKind::ExternalUrl)
            .with_attribute(FieldSchema::new("allow_embed", FieldKind::YesNo))
            .with_attribute(FieldSchema::new("autoplay", FieldKind::Str)),
        FieldSchema::new("duration", FieldKind::Integer)
            .with_min_value(Decimal::ZERO)
            .with_max_value(Decimal::from(28_800)),
        FieldSchema::new("expiration_date", FieldKind::DateTime),
        FieldSchema::new("rating", FieldKind::Float)
            .with_min_value(Decimal::ZERO)
            .with_max_value(Decimal::from(5))
            .with_precision(1),
        FieldSchema::new("view_count", FieldKind::Integer).with_min_value(Decimal::ZERO),
        FieldSchema::new("publication_date", FieldKind::DateTime),
        FieldSchema::new("family_friendly", FieldKind::YesNo),
        FieldSchema::new("restriction", FieldKind::Str)
            .with_attribute(
                FieldSchema::new("relationship", FieldKind::Str).with_allowed(&["allow", "deny"]),
            ),
        FieldSchema::new("gallery_loc", FieldKind::Url)
            .with_attribute(FieldSchema::new("title", FieldKind::Str)),
        FieldSchema::new("price", FieldKind::Float)
            .with_min_value(Decimal::ZERO)
            .with_precision(2)
            .with_attribute(
                FieldSchema::new("currency", FieldKind::Str)
                    .with_pattern(r"^(?P<code>[A-Za-z]{3})$", "code"),
            )
            .with_attribute(
                FieldSchema::new("type", FieldKind::Str).with_allowed(&["rent", "own", "purchase"]),
            ),
        FieldSchema::new("requires_subscription", FieldKind::YesNo),
        FieldSchema::new("uploader", FieldKind::Str)
            .with_max_length(255)
            .with_attribute(FieldSchema::new("info", FieldKind::ExternalUrl)),
        FieldSchema::new("platform", FieldKind::Str)
            .with_attribute(
                FieldSchema::new("relationship", FieldKind::Str).with_allowed(&["allow", "deny"]),
            ),
        FieldSchema::new("live", FieldKind::YesNo),
        FieldSchema::new("tag", FieldKind::Array(Box::new(FieldKind::Str))).with_max_elements(32),
        FieldSchema::new("category", FieldKind::Str).with_max_length(256),
    ]
});

static NEWS_SCHEMA: Lazy<Vec<FieldSchema>> = Lazy::new(|| {
    vec![
        FieldSchema::new("publication_name", FieldKind::Str).required(),
        FieldSchema::new("publication_language", FieldKind::Str)
            .required()
            .with_pattern(r"^(?P<lang>[a-zA-Z]{2,3}(?:-[a-zA-Z]{2,4})?)$", "lang"),
        FieldSchema::new("publication_date", FieldKind::DateTime).required(),
        FieldSchema::new("title", FieldKind::Str).required(),
        FieldSchema::new("genres", FieldKind::Str).with_allowed(&[
            "PressRelease", "Satire", "Blog", "OpEd", "Opinion", "UserGenerated",
        ]),
        FieldSchema::new("keywords", FieldKind::Str),
    ]
});

static LINK_SCHEMA: Lazy<Vec<FieldSchema>> = Lazy::new(|| {
    vec![
        FieldSchema::new("hreflang", FieldKind::Str)
            .required()
            .with_pattern(r"^(?P<lang>[a-zA-Z]{2,3}(?:-[a-zA-Z]{2,4})?|x-default)$", "lang"),
        FieldSchema::new("href", FieldKind::Url).required(),
    ]
});

static MOBILE_SCHEMA: Lazy<Vec<FieldSchema>> = Lazy::new(Vec::new);

macro_rules! field_accessors {
    () => {
        /// Overwrite a field; unknown names are inert
        pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<bool> {
            self.fields.set(name, value)
        }

        /// Overwrite a field together with attribute values
        pub fn set_with_attrs(
            &mut self,
            name: &str,
            value: impl Into<Value>,
            attrs: &[(&str, Value)],
        ) -> Result<bool> {
            self.fields.set_with_attrs(name, value, attrs)
        }

        /// Append for array fields, overwrite otherwise
        pub fn add(&mut self, name: &str, value: impl Into<Value>) -> Result<bool> {
            self.fields.add(name, value)
        }
    };
}

/// Google image extension (`<image:image>`)
#[derive(Debug, Clone)]
pub struct ImageItem {
    fields: FieldSet,
}

impl Default for ImageItem {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageItem {
    /// Create an empty image extension
    pub fn new() -> Self {
        Self {
            fields: FieldSet::from_schema(&IMAGE_SCHEMA),
        }
    }

    field_accessors!();
}

impl SitemapItem for ImageItem {
    fn element_name(&self) -> &'static str {
        "image"
    }

    fn namespace(&self) -> Option<&'static Namespace> {
        Some(&IMAGE)
    }

    fn field_set(&self) -> &FieldSet {
        &self.fields
    }
}

/// Google video extension (`<video:video>`)
#[derive(Debug, Clone)]
pub struct VideoItem {
    fields: FieldSet,
}

impl Default for VideoItem {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoItem {
    /// Create an empty video extension
    pub fn new() -> Self {
        Self {
            fields: FieldSet::from_schema(&VIDEO_SCHEMA),
        }
    }

    field_accessors!();
}

impl SitemapItem for VideoItem {
    fn element_name(&self) -> &'static str {
        "video"
    }

    fn namespace(&self) -> Option<&'static Namespace> {
        Some(&VIDEO)
    }

    fn field_set(&self) -> &FieldSet {
        &self.fields
    }
}

/// Google news extension (`<news:news>`)
#[derive(Debug, Clone)]
pub struct NewsItem {
    fields: FieldSet,
}

impl Default for NewsItem {
    fn default() -> Self {
        Self::new()
    }
}

impl NewsItem {
    /// Create an empty news extension
    pub fn new() -> Self {
        Self {
            fields: FieldSet::from_schema(&NEWS_SCHEMA),
        }
    }

    field_accessors!();
}

impl SitemapItem for NewsItem {
    fn element_name(&self) -> &'static str {
        "news"
    }

    fn namespace(&self) -> Option<&'static Namespace> {
        Some(&NEWS)
    }

    fn field_set(&self) -> &FieldSet {
        &self.fields
    }

    /// News nests its publication name/language under a `publication`
    /// element, so the flat default conversion does not apply.
    fn to_document(&self, ctx: &ResolveContext) -> Result<DocumentNode> {
        let mut publication = DocumentNode::namespaced("news", "publication");
        for (field, child) in [("publication_name", "name"), ("publication_language", "language")] {
            if let Some(Resolved::Scalar(value)) = self.fields.get(field, ctx)? {
                publication.push_child(
                    DocumentNode::namespaced("news", child).with_text(value),
                );
            }
        }

        let mut node = DocumentNode::namespaced("news", "news").with_child(publication);
        for field in ["publication_date", "title", "genres", "keywords"] {
            if let Some(Resolved::Scalar(value)) = self.fields.get(field, ctx)? {
                node.push_child(DocumentNode::namespaced("news", field).with_text(value));
            }
        }
        Ok(node)
    }
}

/// Google mobile extension, an empty `<mobile:mobile/>` marker
#[derive(Debug, Clone)]
pub struct MobileItem {
    fields: FieldSet,
}

impl Default for MobileItem {
    fn default() -> Self {
        Self::new()
    }
}

impl MobileItem {
    /// Create the marker extension
    pub fn new() -> Self {
        Self {
            fields: FieldSet::from_schema(&MOBILE_SCHEMA),
        }
    }
}

impl SitemapItem for MobileItem {
    fn element_name(&self) -> &'static str {
        "mobile"
    }

    fn namespace(&self) -> Option<&'static Namespace> {
        Some(&MOBILE)
    }

    fn field_set(&self) -> &FieldSet {
        &self.fields
    }
}

/// Alternate-language link (`<xhtml:link rel="alternate" .../>`)
#[derive(Debug, Clone)]
pub struct AlternateLink {
    fields: FieldSet,
}

impl AlternateLink {
    /// Create a link for a language and target location
    pub fn new(hreflang: &str, href: &str) -> Result<Self> {
        let mut fields = FieldSet::from_schema(&LINK_SCHEMA);
        fields.set("hreflang", hreflang)?;
        fields.set("href", href)?;
        Ok(Self { fields })
    }
}

impl SitemapItem for AlternateLink {
    fn element_name(&self) -> &'static str {
        "link"
    }

    fn namespace(&self) -> Option<&'static Namespace> {
        Some(&XHTML)
    }

    fn field_set(&self) -> &FieldSet {
        &self.fields
    }

    /// Renders as an attribute-only empty element, not as children.
    fn to_document(&self, ctx: &ResolveContext) -> Result<DocumentNode> {
        let mut node = DocumentNode::namespaced("xhtml", "link").with_attribute("rel", "alternate");
        for field in ["hreflang", "href"] {
            if let Some(Resolved::Scalar(value)) = self.fields.get(field, ctx)? {
                node = node.with_attribute(field, value);
            }
        }
        Ok(node)
    }
}

/// An extension attached to one URL entry
#[derive(Debug, Clone)]
pub enum Extension {
    /// Image extension
    Image(ImageItem),
    /// Video extension
    Video(VideoItem),
    /// News extension
    News(NewsItem),
    /// Mobile marker extension
    Mobile(MobileItem),
    /// Alternate-language link
    Alternate(AlternateLink),
}

impl Extension {
    /// The extension's namespace
    pub fn namespace(&self) -> &'static Namespace {
        match self {
            Extension::Image(_) => &IMAGE,
            Extension::Video(_) => &VIDEO,
            Extension::News(_) => &NEWS,
            Extension::Mobile(_) => &MOBILE,
            Extension::Alternate(_) => &XHTML,
        }
    }

    /// Convert to the extension's document node
    pub fn to_document(&self, ctx: &ResolveContext) -> Result<DocumentNode> {
        match self {
            Extension::Image(item) => item.to_document(ctx),
            Extension::Video(item) => item.to_document(ctx),
            Extension::News(item) => item.to_document(ctx),
            Extension::Mobile(item) => item.to_document(ctx),
            Extension::Alternate(item) => item.to_document(ctx),
        }
    }
}

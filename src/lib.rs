//! Sitemap generation for large sites
//!
//! This crate builds standards-compliant XML sitemaps from typed URL
//! records. Items carry validated fields (location, last modification,
//! change frequency, priority) plus optional image, video, news, mobile
//! and alternate-language extensions. A generator paginates the
//! resulting documents under the sitemaps.org limits, writes a sharded
//! sitemap index, optionally gzips every artifact and publishes the
//! whole set in one move.
//!
//! ```no_run
//! use sitemap_gen::{SitemapGenerator, UrlItem};
//!
//! # fn main() -> sitemap_gen::Result<()> {
//! let mut generator = SitemapGenerator::new();
//! generator.set_domain("https://example.com")?;
//! generator.set_public_dir("/var/www/public");
//!
//! let mut item = UrlItem::new();
//! item.set("loc", "/articles/first-post")?;
//! item.set("lastmod", "2020-01-01")?;
//! item.set("changefreq", "weekly")?;
//! item.set("priority", 0.8f64)?;
//! generator.add_item(item, None);
//!
//! let result = generator.generate()?;
//! println!("wrote {} sitemap file(s)", result.sitemaps.len());
//! # Ok(())
//! # }
//! ```

pub mod collector;
pub mod document;
pub mod error;
pub mod fields;
pub mod items;
pub mod limits;
pub mod normalize;
pub mod paginator;
pub mod writer;

pub use collector::{DataCollector, MemoryCollector, SitemapRecord};
pub use document::{AttributeMap, DocumentNode, NodeBody};
pub use error::{Error, Result, ValidationError};
pub use fields::{FieldKind, FieldSchema, ResolveContext, Resolved, TypedField, Value};
pub use items::{
    AlternateLink, Extension, ImageItem, MobileItem, NewsItem, SitemapItem, UrlItem, VideoItem,
};
pub use limits::Limits;
pub use paginator::{GeneratedSitemaps, SitemapFileRecord, SitemapGenerator};
pub use writer::SitemapWriter;

/// Namespace of the sitemaps.org protocol
pub const SITEMAP_NAMESPACE: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Namespace of the Google image sitemap extension
pub const IMAGE_NAMESPACE: &str = "http://www.google.com/schemas/sitemap-image/1.1";

/// Namespace of the Google video sitemap extension
pub const VIDEO_NAMESPACE: &str = "http://www.google.com/schemas/sitemap-video/1.1";

/// Namespace of the Google news sitemap extension
pub const NEWS_NAMESPACE: &str = "http://www.google.com/schemas/sitemap-news/0.9";

/// Namespace of the Google mobile sitemap extension
pub const MOBILE_NAMESPACE: &str = "http://www.google.com/schemas/sitemap-mobile/1.0";

/// XHTML namespace used by alternate-language link annotations
pub const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

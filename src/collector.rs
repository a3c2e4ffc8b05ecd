//! Item storage backend
//!
//! The paginator pulls already-converted documents from a
//! [`DataCollector`]. The trait is a single-pass cursor per group: once a
//! group is drained it is not restartable without a fresh collector.
//! [`MemoryCollector`] is the default in-memory backend.

use crate::document::DocumentNode;
use crate::error::Result;
use crate::fields::ResolveContext;
use crate::items::{Extension, SitemapItem, UrlItem};
use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;
use url::Url;

/// Group name used when the caller does not name one
pub const DEFAULT_GROUP: &str = "sitemap";

/// One fetched entry: the converted document plus the parsed lastmod the
/// paginator tracks per file
#[derive(Debug, Clone)]
pub struct SitemapRecord {
    /// The `<url>` element tree
    pub document: DocumentNode,
    /// Last-modified date, when the item carried one
    pub lastmod: Option<DateTime<FixedOffset>>,
}

/// Storage backend contract for sitemap items
pub trait DataCollector {
    /// Store an item under a group (the default group when `None`)
    fn add(&mut self, item: UrlItem, group: Option<&str>);

    /// Attach extension items to the most recently stored entry of a
    /// group. Returns `false` when the group has no entry to attach to.
    fn add_extensions(&mut self, extensions: Vec<Extension>, group: Option<&str>) -> bool;

    /// Group names in insertion order
    fn get_groups(&self) -> Vec<String>;

    /// Next converted document of a group, or `None` when drained.
    ///
    /// Conversion happens here: a required field that cannot resolve
    /// aborts the fetch with a validation error.
    fn fetch(&mut self, group: &str) -> Result<Option<SitemapRecord>>;

    /// Drain the remainder of one group
    fn fetch_group(&mut self, group: &str) -> Result<Vec<SitemapRecord>> {
        let mut records = Vec::new();
        while let Some(record) = self.fetch(group)? {
            records.push(record);
        }
        Ok(records)
    }

    /// Drain every group in order
    fn fetch_all(&mut self) -> Result<Vec<SitemapRecord>> {
        let mut records = Vec::new();
        for group in self.get_groups() {
            records.extend(self.fetch_group(&group)?);
        }
        Ok(records)
    }

    /// Whether a group has no records left to fetch
    fn is_last(&self, group: &str) -> bool;

    /// Total items stored under a group
    fn get_group_count(&self, group: &str) -> usize;

    /// Number of groups
    fn get_groups_count(&self) -> usize;

    /// Total items across all groups
    fn get_count(&self) -> usize;

    /// Extension namespaces in use across stored items, in first-seen
    /// order, as (prefix, uri) pairs for the `<urlset>` declaration
    fn get_extensions(&self) -> Vec<(&'static str, &'static str)>;

    /// Base domain handed to URL-capable fields during conversion
    fn set_base_url(&mut self, base: Url);
}

struct GroupState {
    items: Vec<UrlItem>,
    cursor: usize,
}

/// In-memory collector: items are held as live objects and converted on
/// fetch
pub struct MemoryCollector {
    groups: IndexMap<String, GroupState>,
    base: Option<Url>,
}

impl MemoryCollector {
    /// Create an empty collector
    pub fn new() -> Self {
        Self {
            groups: IndexMap::new(),
            base: None,
        }
    }
}

impl Default for MemoryCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl DataCollector for MemoryCollector {
    fn add(&mut self, item: UrlItem, group: Option<&str>) {
        let group = group.unwrap_or(DEFAULT_GROUP);
        self.groups
            .entry(group.to_string())
            .or_insert_with(|| GroupState {
                items: Vec::new(),
                cursor: 0,
            })
            .items
            .push(item);
    }

    fn add_extensions(&mut self, extensions: Vec<Extension>, group: Option<&str>) -> bool {
        let group = group.unwrap_or(DEFAULT_GROUP);
        let Some(item) = self
            .groups
            .get_mut(group)
            .and_then(|state| state.items.last_mut())
        else {
            return false;
        };
        for extension in extensions {
            item.add_extension(extension);
        }
        true
    }

    fn get_groups(&self) -> Vec<String> {
        self.groups.keys().cloned().collect()
    }

    fn fetch(&mut self, group: &str) -> Result<Option<SitemapRecord>> {
        let base = self.base.clone();
        let Some(state) = self.groups.get_mut(group) else {
            return Ok(None);
        };
        let index = state.cursor;
        if index >= state.items.len() {
            return Ok(None);
        }
        state.cursor += 1;
        let item = &state.items[index];

        let ctx = match &base {
            Some(base) => ResolveContext::with_base(base),
            None => ResolveContext::new(),
        };
        let document = item.to_document(&ctx)?;
        Ok(Some(SitemapRecord {
            document,
            lastmod: item.lastmod(),
        }))
    }

    fn is_last(&self, group: &str) -> bool {
        match self.groups.get(group) {
            Some(state) => state.cursor >= state.items.len(),
            None => true,
        }
    }

    fn get_group_count(&self, group: &str) -> usize {
        self.groups.get(group).map_or(0, |state| state.items.len())
    }

    fn get_groups_count(&self) -> usize {
        self.groups.len()
    }

    fn get_count(&self) -> usize {
        self.groups.values().map(|state| state.items.len()).sum()
    }

    fn get_extensions(&self) -> Vec<(&'static str, &'static str)> {
        let mut namespaces: IndexMap<&'static str, &'static str> = IndexMap::new();
        for state in self.groups.values() {
            for item in &state.items {
                for namespace in item.extensions().namespaces() {
                    namespaces.entry(namespace.prefix).or_insert(namespace.uri);
                }
            }
        }
        namespaces.into_iter().collect()
    }

    fn set_base_url(&mut self, base: Url) {
        self.base = Some(base);
    }
}

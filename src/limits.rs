//! Limits for sitemap file production
//!
//! This module defines the size and count ceilings from the sitemaps.org
//! protocol that drive file rotation and index sharding.

use crate::error::{Error, Result};

/// Default maximum number of URL entries per sitemap file.
pub const MAX_SITEMAP_URLS: usize = 50_000;

/// Default maximum sitemap file size in bytes.
pub const MAX_SITEMAP_BYTES: u64 = 52_000_000;

/// Safety margin subtracted from the byte ceiling so the closing tags
/// always fit after the record that crosses the threshold.
pub const SITEMAP_BYTE_MARGIN: u64 = 1_000;

/// Default maximum number of sitemap references per index shard.
pub const MAX_INDEX_ENTRIES: usize = 1_000;

/// Chunk size used when re-reading files for gzip compression.
pub const GZIP_CHUNK_BYTES: usize = 8_192;

/// Production limits configuration
#[derive(Debug, Clone)]
pub struct Limits {
    /// Maximum URL entries per sitemap file
    pub max_sitemap_urls: usize,

    /// Maximum sitemap file size in bytes
    pub max_sitemap_bytes: u64,

    /// Bytes held back from the size ceiling for closing tags
    pub byte_margin: u64,

    /// Maximum entries per sitemap index shard
    pub max_index_entries: usize,

    /// Read chunk size for compression
    pub gzip_chunk: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_sitemap_urls: MAX_SITEMAP_URLS,
            max_sitemap_bytes: MAX_SITEMAP_BYTES,
            byte_margin: SITEMAP_BYTE_MARGIN,
            max_index_entries: MAX_INDEX_ENTRIES,
            gzip_chunk: GZIP_CHUNK_BYTES,
        }
    }
}

impl Limits {
    /// Create a new Limits with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Effective byte ceiling after the safety margin
    pub fn byte_ceiling(&self) -> u64 {
        self.max_sitemap_bytes.saturating_sub(self.byte_margin)
    }

    /// Whether a file at `urls` entries and `bytes` size must be rotated
    pub fn needs_rotation(&self, urls: usize, bytes: u64) -> bool {
        urls >= self.max_sitemap_urls || bytes >= self.byte_ceiling()
    }

    /// Check that a single record fits the file size ceiling at all
    pub fn check_record_size(&self, bytes: u64) -> Result<()> {
        if bytes > self.byte_ceiling() {
            Err(Error::LimitExceeded(format!(
                "record size {} bytes exceeds the sitemap ceiling of {} bytes",
                bytes,
                self.byte_ceiling()
            )))
        } else {
            Ok(())
        }
    }

}

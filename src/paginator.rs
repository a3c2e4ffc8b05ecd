//! Sitemap pagination and publishing
//!
//! [`SitemapGenerator`] drives the whole pipeline: it pulls converted
//! documents from the data collector, rotates sitemap files under the
//! count/byte limits, optionally gzips every artifact, writes the
//! sitemap index (sharded at the index entry limit) and finally
//! publishes from a scratch directory into the public directory.
//!
//! Everything is generated into the scratch directory first and moved in
//! one pass at the end, so concurrent readers of the public directory
//! never see a half-written file set. The move itself is not atomic
//! across files; a failure mid-move can leave a mixed state.

use crate::collector::{DataCollector, MemoryCollector};
use crate::error::{Error, Result};
use crate::fields::format_datetime;
use crate::items::UrlItem;
use crate::limits::Limits;
use crate::normalize::normalize;
use crate::writer::SitemapWriter;
use chrono::{DateTime, FixedOffset};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use url::Url;

/// Name of the scratch directory created inside the public directory
const SCRATCH_DIR: &str = ".sitemap-tmp";

/// One produced sitemap file
#[derive(Debug, Clone)]
pub struct SitemapFileRecord {
    /// Final filename (with `.gz` suffix when compressed)
    pub filename: String,
    /// Number of URL entries written
    pub url_count: usize,
    /// Final byte size
    pub byte_size: u64,
    /// Maximum lastmod seen among the file's entries
    pub lastmod: Option<DateTime<FixedOffset>>,
}

/// Result of a generation run
#[derive(Debug, Clone)]
pub struct GeneratedSitemaps {
    /// Sitemap files in production order
    pub sitemaps: Vec<SitemapFileRecord>,
    /// Index shard filenames in production order
    pub index_files: Vec<String>,
}

/// Orchestrates sitemap generation for one site
pub struct SitemapGenerator {
    domain: Option<Url>,
    public_dir: Option<PathBuf>,
    sitemaps_path: String,
    index_name: String,
    compress: bool,
    limits: Limits,
    collector: Option<Box<dyn DataCollector>>,
}

impl SitemapGenerator {
    /// Create an unconfigured generator
    pub fn new() -> Self {
        Self {
            domain: None,
            public_dir: None,
            sitemaps_path: String::new(),
            index_name: "index".to_string(),
            compress: false,
            limits: Limits::default(),
            collector: None,
        }
    }

    /// Set the site domain all relative locations resolve against
    pub fn set_domain(&mut self, domain: &str) -> Result<()> {
        match normalize(domain) {
            Some(url) => {
                self.domain = Some(url);
                Ok(())
            }
            None => Err(Error::Configuration(format!(
                "'{}' is not a valid absolute http(s) domain",
                domain
            ))),
        }
    }

    /// Set the public directory artifacts are published into
    pub fn set_public_dir(&mut self, path: impl Into<PathBuf>) {
        self.public_dir = Some(path.into());
    }

    /// Set the subpath of the public directory sitemaps live under
    pub fn set_sitemaps_path(&mut self, path: &str) {
        self.sitemaps_path = path.trim_matches('/').to_string();
    }

    /// Set the index base name (default `index`)
    pub fn set_index_name(&mut self, name: &str) {
        self.index_name = name.to_string();
    }

    /// Enable or disable gzip compression of every artifact
    pub fn set_compress(&mut self, compress: bool) {
        self.compress = compress;
    }

    /// Override the production limits
    pub fn set_limits(&mut self, limits: Limits) {
        self.limits = limits;
    }

    /// Replace the data source
    pub fn set_collector(&mut self, collector: Box<dyn DataCollector>) {
        self.collector = Some(collector);
    }

    /// Store an item, creating the in-memory collector on first use
    pub fn add_item(&mut self, item: UrlItem, group: Option<&str>) {
        self.collector
            .get_or_insert_with(|| Box::new(MemoryCollector::new()))
            .add(item, group);
    }

    /// Run the full pipeline: generate, compress, index, publish.
    ///
    /// Configuration errors are raised before any I/O. A failure during
    /// generation propagates immediately and leaves the scratch
    /// directory in place for diagnosis; only a successful run removes
    /// it.
    pub fn generate(&mut self) -> Result<GeneratedSitemaps> {
        let domain = self
            .domain
            .clone()
            .ok_or_else(|| Error::Configuration("domain is not set".to_string()))?;
        let public_dir = self
            .public_dir
            .clone()
            .ok_or_else(|| Error::Configuration("public directory is not set".to_string()))?;
        if !public_dir.is_dir() {
            return Err(Error::Configuration(format!(
                "public directory '{}' does not exist",
                public_dir.display()
            )));
        }
        let collector = self
            .collector
            .as_mut()
            .ok_or_else(|| Error::Configuration("data source is not set".to_string()))?;

        let scratch = public_dir.join(SCRATCH_DIR);
        fs::create_dir_all(&scratch)?;
        collector.set_base_url(domain.clone());
        let extensions = collector.get_extensions();

        let mut writer = SitemapWriter::new();
        writer.set_work_dir(&scratch);

        let mut sitemaps = Vec::new();
        for group in collector.get_groups() {
            sitemaps.extend(generate_group(
                collector.as_mut(),
                &mut writer,
                &group,
                &extensions,
                &self.limits,
            )?);
        }

        if self.compress {
            for record in &mut sitemaps {
                let compressed = compress_file(&scratch.join(&record.filename), self.limits.gzip_chunk)?;
                record.filename = file_name(&compressed);
                record.byte_size = fs::metadata(&compressed)?.len();
            }
        }

        let mut index_files = self.write_index(&mut writer, &domain, &sitemaps)?;
        if self.compress {
            for name in &mut index_files {
                let compressed = compress_file(&scratch.join(&*name), self.limits.gzip_chunk)?;
                *name = file_name(&compressed);
            }
        }

        self.publish(&scratch, &public_dir)?;

        Ok(GeneratedSitemaps {
            sitemaps,
            index_files,
        })
    }

    /// Write the index shard(s) referencing the produced files
    fn write_index(
        &self,
        writer: &mut SitemapWriter,
        domain: &Url,
        sitemaps: &[SitemapFileRecord],
    ) -> Result<Vec<String>> {
        if sitemaps.is_empty() {
            return Ok(Vec::new());
        }

        let per_shard = self.limits.max_index_entries;
        let shard_count = sitemaps.len().div_ceil(per_shard);
        let mut index_files = Vec::with_capacity(shard_count);

        for (shard, chunk) in sitemaps.chunks(per_shard).enumerate() {
            let name = if shard_count == 1 {
                format!("{}.xml", self.index_name)
            } else {
                format!("{}-{}.xml", self.index_name, shard + 1)
            };

            writer.open_sitemap_index(&name)?;
            for record in chunk {
                let loc = self.public_url(domain, &record.filename);
                let lastmod = record.lastmod.map(|dt| format_datetime(&dt));
                writer.add_sitemap(&loc, lastmod.as_deref())?;
            }
            writer.close_sitemap_index()?;
            index_files.push(name);
        }

        Ok(index_files)
    }

    /// Absolute public URL of a produced file
    fn public_url(&self, domain: &Url, filename: &str) -> String {
        let base = domain.as_str().trim_end_matches('/');
        if self.sitemaps_path.is_empty() {
            format!("{}/{}", base, filename)
        } else {
            format!("{}/{}/{}", base, self.sitemaps_path, filename)
        }
    }

    /// Move the generated artifacts into the public directory.
    ///
    /// Stale index files matching the configured index name are removed
    /// first so readers never see an old index pointing at moved files.
    fn publish(&self, scratch: &Path, public_dir: &Path) -> Result<()> {
        let target = if self.sitemaps_path.is_empty() {
            public_dir.to_path_buf()
        } else {
            public_dir.join(&self.sitemaps_path)
        };
        fs::create_dir_all(&target)?;

        for entry in fs::read_dir(&target)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with(&self.index_name)
                && (name.ends_with(".xml") || name.ends_with(".xml.gz"))
            {
                fs::remove_file(entry.path())?;
            }
        }

        for entry in fs::read_dir(scratch)? {
            let entry = entry?;
            fs::rename(entry.path(), target.join(entry.file_name()))?;
        }
        fs::remove_dir(scratch)?;
        Ok(())
    }
}

impl Default for SitemapGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Produce the sitemap files for one group, rotating on the limits
fn generate_group(
    collector: &mut dyn DataCollector,
    writer: &mut SitemapWriter,
    group: &str,
    extensions: &[(&'static str, &'static str)],
    limits: &Limits,
) -> Result<Vec<SitemapFileRecord>> {
    let mut produced = Vec::new();
    let mut file_no = 1;
    let mut open = false;
    let mut url_count = 0;
    let mut lastmod: Option<DateTime<FixedOffset>> = None;
    let mut filename = String::new();
    let mut written = 0;

    while let Some(record) = collector.fetch(group)? {
        if !open {
            filename = format!("{}-{}.xml", group, file_no);
            writer.open_sitemap(&filename, extensions)?;
            open = true;
            url_count = 0;
            lastmod = None;
            written = writer.sitemap_size()?;
        }

        writer.add_url(&record.document)?;
        let size = writer.sitemap_size()?;
        limits.check_record_size(size - written)?;
        written = size;
        url_count += 1;
        lastmod = match (lastmod, record.lastmod) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (seen, None) => seen,
            (None, new) => new,
        };

        if limits.needs_rotation(url_count, size) {
            let byte_size = writer.close_sitemap()?;
            produced.push(SitemapFileRecord {
                filename: filename.clone(),
                url_count,
                byte_size,
                lastmod,
            });
            open = false;
            file_no += 1;
        }
    }

    if open {
        let byte_size = writer.close_sitemap()?;
        produced.push(SitemapFileRecord {
            filename,
            url_count,
            byte_size,
            lastmod,
        });
    }

    Ok(produced)
}

/// Gzip a file in fixed-size chunks, remove the original and return the
/// `.gz` path
fn compress_file(path: &Path, chunk: usize) -> Result<PathBuf> {
    let gz_path = PathBuf::from(format!("{}.gz", path.display()));

    let mut input = File::open(path)?;
    let output = File::create(&gz_path)?;
    let mut encoder = GzEncoder::new(BufWriter::new(output), Compression::default());

    let mut buffer = vec![0u8; chunk];
    loop {
        let read = input.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        encoder.write_all(&buffer[..read])?;
    }
    encoder.finish()?.flush()?;

    fs::remove_file(path)?;
    Ok(gz_path)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn item(loc: &str) -> UrlItem {
        let mut item = UrlItem::new();
        item.set("loc", loc).unwrap();
        item
    }

    #[test]
    fn test_missing_domain_is_config_error() {
        let mut generator = SitemapGenerator::new();
        generator.set_public_dir("/tmp");
        generator.add_item(item("/a"), None);
        assert!(matches!(generator.generate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_missing_public_dir_is_config_error() {
        let mut generator = SitemapGenerator::new();
        generator.set_domain("https://example.com").unwrap();
        generator.add_item(item("/a"), None);
        assert!(matches!(generator.generate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_nonexistent_public_dir_is_config_error() {
        let mut generator = SitemapGenerator::new();
        generator.set_domain("https://example.com").unwrap();
        generator.set_public_dir("/no/such/directory");
        generator.add_item(item("/a"), None);
        assert!(matches!(generator.generate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_missing_data_source_is_config_error() {
        let dir = TempDir::new().unwrap();
        let mut generator = SitemapGenerator::new();
        generator.set_domain("https://example.com").unwrap();
        generator.set_public_dir(dir.path());
        assert!(matches!(generator.generate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_invalid_domain_rejected() {
        let mut generator = SitemapGenerator::new();
        assert!(generator.set_domain("not a url").is_err());
        assert!(generator.set_domain("ftp://example.com").is_err());
    }

    #[test]
    fn test_public_url_shapes() {
        let mut generator = SitemapGenerator::new();
        let domain = Url::parse("https://example.com").unwrap();
        assert_eq!(
            generator.public_url(&domain, "sitemap-1.xml"),
            "https://example.com/sitemap-1.xml"
        );

        generator.set_sitemaps_path("/sitemaps/");
        assert_eq!(
            generator.public_url(&domain, "sitemap-1.xml"),
            "https://example.com/sitemaps/sitemap-1.xml"
        );
    }

    #[test]
    fn test_generate_single_file_and_index() {
        let dir = TempDir::new().unwrap();
        let mut generator = SitemapGenerator::new();
        generator.set_domain("https://example.com").unwrap();
        generator.set_public_dir(dir.path());
        generator.add_item(item("/a"), None);
        generator.add_item(item("/b"), None);

        let result = generator.generate().unwrap();
        assert_eq!(result.sitemaps.len(), 1);
        assert_eq!(result.sitemaps[0].filename, "sitemap-1.xml");
        assert_eq!(result.sitemaps[0].url_count, 2);
        assert_eq!(result.index_files, vec!["index.xml".to_string()]);

        assert!(dir.path().join("sitemap-1.xml").is_file());
        let index = std::fs::read_to_string(dir.path().join("index.xml")).unwrap();
        assert!(index.contains("<loc>https://example.com/sitemap-1.xml</loc>"));
        // Scratch directory is gone after a successful publish.
        assert!(!dir.path().join(SCRATCH_DIR).exists());
    }

    #[test]
    fn test_count_limit_splits_files() {
        let dir = TempDir::new().unwrap();
        let mut generator = SitemapGenerator::new();
        generator.set_domain("https://example.com").unwrap();
        generator.set_public_dir(dir.path());
        let mut limits = Limits::default();
        limits.max_sitemap_urls = 3;
        generator.set_limits(limits);

        for i in 0..7 {
            generator.add_item(item(&format!("/page/{}", i)), Some("pages"));
        }

        let result = generator.generate().unwrap();
        let counts: Vec<usize> = result.sitemaps.iter().map(|r| r.url_count).collect();
        assert_eq!(counts, vec![3, 3, 1]);
        let names: Vec<&str> = result.sitemaps.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, vec!["pages-1.xml", "pages-2.xml", "pages-3.xml"]);
    }

    #[test]
    fn test_default_count_limit_boundary() {
        let dir = TempDir::new().unwrap();
        let mut generator = SitemapGenerator::new();
        generator.set_domain("https://example.com").unwrap();
        generator.set_public_dir(dir.path());

        for i in 0..50_001 {
            generator.add_item(item(&format!("/p/{}", i)), None);
        }

        let result = generator.generate().unwrap();
        let counts: Vec<usize> = result.sitemaps.iter().map(|r| r.url_count).collect();
        assert_eq!(counts, vec![50_000, 1]);
        assert_eq!(result.index_files, vec!["index.xml".to_string()]);
    }

    #[test]
    fn test_byte_limit_splits_files() {
        let dir = TempDir::new().unwrap();
        let mut generator = SitemapGenerator::new();
        generator.set_domain("https://example.com").unwrap();
        generator.set_public_dir(dir.path());
        let mut limits = Limits::default();
        limits.max_sitemap_bytes = 700;
        limits.byte_margin = 100;
        generator.set_limits(limits);

        for i in 0..6 {
            generator.add_item(item(&format!("/page/{}", i)), None);
        }

        let result = generator.generate().unwrap();
        assert!(result.sitemaps.len() > 1);
        for record in &result.sitemaps {
            assert!(record.byte_size < 700 + 200, "file too large: {:?}", record);
        }
    }

    #[test]
    fn test_oversized_record_is_fatal() {
        let dir = TempDir::new().unwrap();
        let mut generator = SitemapGenerator::new();
        generator.set_domain("https://example.com").unwrap();
        generator.set_public_dir(dir.path());
        let mut limits = Limits::default();
        limits.max_sitemap_bytes = 150;
        limits.byte_margin = 0;
        generator.set_limits(limits);

        generator.add_item(item(&format!("/{}", "a".repeat(300))), None);

        assert!(matches!(generator.generate(), Err(Error::LimitExceeded(_))));
    }

    #[test]
    fn test_index_sharding() {
        let dir = TempDir::new().unwrap();
        let mut generator = SitemapGenerator::new();
        generator.set_domain("https://example.com").unwrap();
        generator.set_public_dir(dir.path());
        let mut limits = Limits::default();
        limits.max_sitemap_urls = 1;
        limits.max_index_entries = 2;
        generator.set_limits(limits);

        for i in 0..5 {
            generator.add_item(item(&format!("/p/{}", i)), None);
        }

        let result = generator.generate().unwrap();
        assert_eq!(result.sitemaps.len(), 5);
        assert_eq!(
            result.index_files,
            vec!["index-1.xml", "index-2.xml", "index-3.xml"]
        );
    }

    #[test]
    fn test_compressed_artifacts() {
        let dir = TempDir::new().unwrap();
        let mut generator = SitemapGenerator::new();
        generator.set_domain("https://example.com").unwrap();
        generator.set_public_dir(dir.path());
        generator.set_compress(true);
        generator.add_item(item("/a"), None);

        let result = generator.generate().unwrap();
        assert_eq!(result.sitemaps[0].filename, "sitemap-1.xml.gz");
        assert_eq!(result.index_files, vec!["index.xml.gz"]);
        assert!(dir.path().join("sitemap-1.xml.gz").is_file());
        assert!(!dir.path().join("sitemap-1.xml").exists());

        let index = std::fs::read_to_string(dir.path().join("index.xml.gz"));
        // Compressed output is not valid UTF-8 text.
        assert!(index.is_err() || !index.unwrap().starts_with("<?xml"));
    }

    #[test]
    fn test_stale_index_files_removed() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("index.xml"), "old").unwrap();
        std::fs::write(dir.path().join("index-7.xml"), "old").unwrap();
        std::fs::write(dir.path().join("unrelated.xml"), "keep").unwrap();

        let mut generator = SitemapGenerator::new();
        generator.set_domain("https://example.com").unwrap();
        generator.set_public_dir(dir.path());
        generator.add_item(item("/a"), None);
        generator.generate().unwrap();

        assert!(!dir.path().join("index-7.xml").exists());
        assert!(dir.path().join("unrelated.xml").is_file());
        let index = std::fs::read_to_string(dir.path().join("index.xml")).unwrap();
        assert_ne!(index, "old");
    }

    #[test]
    fn test_lastmod_tracked_per_file() {
        let dir = TempDir::new().unwrap();
        let mut generator = SitemapGenerator::new();
        generator.set_domain("https://example.com").unwrap();
        generator.set_public_dir(dir.path());

        let mut older = item("/old");
        older.set("lastmod", "2019-06-01").unwrap();
        let mut newer = item("/new");
        newer.set("lastmod", "2020-01-01").unwrap();
        generator.add_item(older, None);
        generator.add_item(newer, None);

        let result = generator.generate().unwrap();
        let lastmod = result.sitemaps[0].lastmod.unwrap();
        assert_eq!(format_datetime(&lastmod), "2020-01-01");

        let index = std::fs::read_to_string(dir.path().join("index.xml")).unwrap();
        assert!(index.contains("<lastmod>2020-01-01</lastmod>"));
    }
}

//! End-to-end generation tests: items in, published XML artifacts out.

use flate2::read::GzDecoder;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use sitemap_gen::{
    AlternateLink, Extension, ImageItem, Limits, SitemapGenerator, UrlItem, IMAGE_NAMESPACE,
    SITEMAP_NAMESPACE, XHTML_NAMESPACE,
};
use std::io::Read;
use tempfile::TempDir;

fn generator_for(dir: &TempDir) -> SitemapGenerator {
    let mut generator = SitemapGenerator::new();
    generator.set_domain("https://example.com").unwrap();
    generator.set_public_dir(dir.path());
    generator
}

fn item(loc: &str) -> UrlItem {
    let mut item = UrlItem::new();
    item.set("loc", loc).unwrap();
    item
}

fn read_published(dir: &TempDir, name: &str) -> String {
    std::fs::read_to_string(dir.path().join(name)).unwrap()
}

#[test]
fn full_pipeline_produces_sitemap_and_index() {
    let dir = TempDir::new().unwrap();
    let mut generator = generator_for(&dir);

    let mut entry = item("/articles/first-post");
    entry.set("lastmod", "2020-01-01").unwrap();
    entry.set("changefreq", "weekly").unwrap();
    entry.set("priority", 0.8f64).unwrap();

    let mut image = ImageItem::new();
    image.set("loc", "/images/cover.png").unwrap();
    image.set("caption", "Cover art").unwrap();
    entry.add_extension(Extension::Image(image));

    let link = AlternateLink::new("de", "/de/artikel/erster-beitrag").unwrap();
    entry.add_extension(Extension::Alternate(link));

    generator.add_item(entry, None);
    let result = generator.generate().unwrap();

    assert_eq!(result.sitemaps.len(), 1);
    assert_eq!(result.index_files, vec!["index.xml".to_string()]);

    let sitemap = read_published(&dir, "sitemap-1.xml");
    let doc = roxmltree::Document::parse(&sitemap).unwrap();
    let root = doc.root_element();
    assert_eq!(root.tag_name().name(), "urlset");
    assert_eq!(root.tag_name().namespace(), Some(SITEMAP_NAMESPACE));

    let texts: Vec<(&str, &str)> = root
        .descendants()
        .filter(|n| n.is_element() && n.text().is_some() && n.children().all(|c| !c.is_element()))
        .map(|n| (n.tag_name().name(), n.text().unwrap().trim()))
        .filter(|(_, text)| !text.is_empty())
        .collect();
    assert_eq!(
        texts,
        vec![
            ("loc", "https://example.com/articles/first-post"),
            ("lastmod", "2020-01-01"),
            ("changefreq", "weekly"),
            ("priority", "0.8"),
            ("loc", "https://example.com/images/cover.png"),
            ("caption", "Cover art"),
        ]
    );

    let image_loc = root
        .descendants()
        .find(|n| n.tag_name().name() == "loc" && n.tag_name().namespace() == Some(IMAGE_NAMESPACE))
        .unwrap();
    assert_eq!(image_loc.text(), Some("https://example.com/images/cover.png"));

    let link = root
        .descendants()
        .find(|n| n.tag_name().name() == "link" && n.tag_name().namespace() == Some(XHTML_NAMESPACE))
        .unwrap();
    assert_eq!(link.attribute("rel"), Some("alternate"));
    assert_eq!(link.attribute("hreflang"), Some("de"));
    assert_eq!(
        link.attribute("href"),
        Some("https://example.com/de/artikel/erster-beitrag")
    );

    let index = read_published(&dir, "index.xml");
    let doc = roxmltree::Document::parse(&index).unwrap();
    assert_eq!(doc.root_element().tag_name().name(), "sitemapindex");
    assert!(index.contains("<loc>https://example.com/sitemap-1.xml</loc>"));
    assert!(index.contains("<lastmod>2020-01-01</lastmod>"));
}

#[test]
fn groups_paginate_independently() {
    let dir = TempDir::new().unwrap();
    let mut generator = generator_for(&dir);
    let mut limits = Limits::default();
    limits.max_sitemap_urls = 2;
    generator.set_limits(limits);

    for i in 0..3 {
        generator.add_item(item(&format!("/article/{}", i)), Some("articles"));
    }
    generator.add_item(item("/about"), Some("static"));

    let result = generator.generate().unwrap();
    let names: Vec<&str> = result.sitemaps.iter().map(|r| r.filename.as_str()).collect();
    assert_eq!(names, vec!["articles-1.xml", "articles-2.xml", "static-1.xml"]);

    let second = read_published(&dir, "articles-2.xml");
    assert!(second.contains("<loc>https://example.com/article/2</loc>"));
    let index = read_published(&dir, "index.xml");
    assert!(index.contains("https://example.com/articles-1.xml"));
    assert!(index.contains("https://example.com/static-1.xml"));
}

#[test]
fn sitemaps_path_shapes_index_urls_and_target_dir() {
    let dir = TempDir::new().unwrap();
    let mut generator = generator_for(&dir);
    generator.set_sitemaps_path("sitemaps");
    generator.add_item(item("/a"), None);

    generator.generate().unwrap();

    let target = dir.path().join("sitemaps");
    assert!(target.join("sitemap-1.xml").is_file());
    let index = std::fs::read_to_string(target.join("index.xml")).unwrap();
    assert!(index.contains("<loc>https://example.com/sitemaps/sitemap-1.xml</loc>"));
}

#[test]
fn compressed_run_round_trips_through_gzip() {
    let dir = TempDir::new().unwrap();
    let mut generator = generator_for(&dir);
    generator.set_compress(true);
    generator.add_item(item("/a"), None);

    let result = generator.generate().unwrap();
    assert_eq!(result.sitemaps[0].filename, "sitemap-1.xml.gz");

    let compressed = std::fs::File::open(dir.path().join("sitemap-1.xml.gz")).unwrap();
    let mut xml = String::new();
    GzDecoder::new(compressed).read_to_string(&mut xml).unwrap();
    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(xml.contains("<loc>https://example.com/a</loc>"));
    roxmltree::Document::parse(&xml).unwrap();

    // Index entries point at the compressed names.
    let compressed = std::fs::File::open(dir.path().join("index.xml.gz")).unwrap();
    let mut index = String::new();
    GzDecoder::new(compressed).read_to_string(&mut index).unwrap();
    assert!(index.contains("<loc>https://example.com/sitemap-1.xml.gz</loc>"));
}

#[test]
fn regeneration_replaces_previous_run() {
    let dir = TempDir::new().unwrap();

    let mut first = generator_for(&dir);
    first.add_item(item("/old"), None);
    first.generate().unwrap();

    let mut second = generator_for(&dir);
    second.add_item(item("/new"), None);
    second.generate().unwrap();

    let sitemap = read_published(&dir, "sitemap-1.xml");
    assert!(sitemap.contains("/new"));
    assert!(!sitemap.contains("/old"));
    assert!(!dir.path().join(".sitemap-tmp").exists());
}

#[test]
fn output_has_no_trailing_whitespace() {
    let dir = TempDir::new().unwrap();
    let mut generator = generator_for(&dir);
    generator.add_item(item("/a"), None);
    generator.generate().unwrap();

    for name in ["sitemap-1.xml", "index.xml"] {
        let content = read_published(&dir, name);
        assert_eq!(content, content.trim_end(), "{} has trailing whitespace", name);
    }
}

#[test]
fn special_characters_are_escaped() {
    let dir = TempDir::new().unwrap();
    let mut generator = generator_for(&dir);
    generator.add_item(item("/search?q=a&lang=en"), None);
    generator.generate().unwrap();

    let sitemap = read_published(&dir, "sitemap-1.xml");
    assert!(sitemap.contains("<loc>https://example.com/search?q=a&amp;lang=en</loc>"));

    let doc = roxmltree::Document::parse(&sitemap).unwrap();
    let loc = doc
        .descendants()
        .find(|n| n.tag_name().name() == "loc")
        .unwrap();
    assert_eq!(loc.text(), Some("https://example.com/search?q=a&lang=en"));
}

proptest! {
    #[test]
    fn priority_always_renders_one_fractional_digit(value in 0.0f64..=1.0f64) {
        let mut entry = UrlItem::new();
        entry.set("loc", "/p").unwrap();
        entry.set("priority", value).unwrap();

        let base = url::Url::parse("https://example.com").unwrap();
        let ctx = sitemap_gen::ResolveContext::with_base(&base);
        let doc = sitemap_gen::SitemapItem::to_document(&entry, &ctx).unwrap();
        let rendered = format!("{:?}", doc);
        // A stored priority renders with exactly one digit after the point.
        let re = regex::Regex::new(r#""(\d+\.\d)""#).unwrap();
        prop_assert!(re.is_match(&rendered), "no 1-digit priority in {}", rendered);
    }

    #[test]
    fn normalization_is_idempotent(host in "[a-z]{1,10}\\.(com|org|net)", path in "[a-z0-9/]{0,20}") {
        let input = format!("https://{}/{}", host, path);
        if let Some(first) = sitemap_gen::normalize::normalize(&input) {
            let second = sitemap_gen::normalize::normalize(first.as_str());
            prop_assert_eq!(Some(first), second);
        }
    }
}

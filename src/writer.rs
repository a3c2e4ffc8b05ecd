//! Incremental XML serializer
//!
//! Writes sitemap and sitemap-index documents record by record. The
//! writer holds at most one record's worth of XML in memory: every
//! `add_*` call is flushed to disk before returning. Closing a document
//! trims trailing whitespace byte-by-byte from the end of the file, as
//! consumers reject whitespace after the closing tag.

use crate::document::{DocumentNode, NodeBody};
use crate::error::{Error, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

const URLSET: &str = "urlset";
const SITEMAPINDEX: &str = "sitemapindex";

struct OpenDocument {
    path: PathBuf,
    root: &'static str,
    writer: Writer<BufWriter<File>>,
}

/// Writes one sitemap or index document at a time into a work directory
pub struct SitemapWriter {
    work_dir: PathBuf,
    current: Option<OpenDocument>,
}

impl SitemapWriter {
    /// Create a writer targeting the current directory
    pub fn new() -> Self {
        Self {
            work_dir: PathBuf::from("."),
            current: None,
        }
    }

    /// Set the directory files are written into
    pub fn set_work_dir(&mut self, path: impl Into<PathBuf>) {
        self.work_dir = path.into();
    }

    /// Open a sitemap document: XML prolog, `<urlset>` with the protocol
    /// namespace plus one `xmlns:<prefix>` per extension in use.
    pub fn open_sitemap(&mut self, name: &str, extensions: &[(&str, &str)]) -> Result<()> {
        self.open_document(URLSET, name, extensions)
    }

    /// Open a sitemap-index document
    pub fn open_sitemap_index(&mut self, name: &str) -> Result<()> {
        self.open_document(SITEMAPINDEX, name, &[])
    }

    fn open_document(
        &mut self,
        root: &'static str,
        name: &str,
        extensions: &[(&str, &str)],
    ) -> Result<()> {
        if self.current.is_some() {
            return Err(Error::Xml("a document is already open".to_string()));
        }

        let path = self.work_dir.join(name);
        let file = File::create(&path)?;
        let mut writer = Writer::new_with_indent(BufWriter::new(file), b' ', 1);

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut start = BytesStart::new(root);
        start.push_attribute(("xmlns", crate::SITEMAP_NAMESPACE));
        for (prefix, uri) in extensions {
            start.push_attribute((format!("xmlns:{}", prefix).as_str(), *uri));
        }
        writer.write_event(Event::Start(start))?;
        writer.get_mut().flush()?;

        self.current = Some(OpenDocument { path, root, writer });
        Ok(())
    }

    /// Write one URL entry and flush it to disk
    pub fn add_url(&mut self, record: &DocumentNode) -> Result<()> {
        let doc = self.open_for(URLSET, "add_url")?;
        write_node(&mut doc.writer, record)?;
        doc.writer.get_mut().flush()?;
        Ok(())
    }

    /// Write one index entry (`<sitemap>` with loc and optional lastmod)
    pub fn add_sitemap(&mut self, loc: &str, lastmod: Option<&str>) -> Result<()> {
        let mut entry =
            DocumentNode::element("sitemap").with_child(DocumentNode::text_element("loc", loc));
        if let Some(lastmod) = lastmod {
            entry.push_child(DocumentNode::text_element("lastmod", lastmod));
        }

        let doc = self.open_for(SITEMAPINDEX, "add_sitemap")?;
        write_node(&mut doc.writer, &entry)?;
        doc.writer.get_mut().flush()?;
        Ok(())
    }

    /// Close the open sitemap and return its final byte size
    pub fn close_sitemap(&mut self) -> Result<u64> {
        self.close_document(URLSET, "close_sitemap")
    }

    /// Close the open sitemap index and return its final byte size
    pub fn close_sitemap_index(&mut self) -> Result<u64> {
        self.close_document(SITEMAPINDEX, "close_sitemap_index")
    }

    fn close_document(&mut self, root: &'static str, op: &str) -> Result<u64> {
        let mut doc = match self.current.take() {
            Some(doc) if doc.root == root => doc,
            Some(doc) => {
                let open_root = doc.root;
                self.current = Some(doc);
                return Err(Error::Xml(format!(
                    "{} called while a <{}> document is open",
                    op, open_root
                )));
            }
            None => {
                return Err(Error::Xml(format!("{} called with no open document", op)));
            }
        };

        doc.writer.write_event(Event::End(BytesEnd::new(doc.root)))?;
        doc.writer.get_mut().flush()?;
        drop(doc.writer);

        trim_trailing_whitespace(&doc.path)
    }

    /// Byte size of the open document as flushed so far
    pub fn sitemap_size(&self) -> Result<u64> {
        match &self.current {
            Some(doc) => Ok(doc.writer.get_ref().get_ref().metadata()?.len()),
            None => Err(Error::Xml("no open document".to_string())),
        }
    }

    fn open_for(&mut self, root: &'static str, op: &str) -> Result<&mut OpenDocument> {
        match self.current.as_ref().map(|doc| doc.root) {
            Some(open_root) if open_root == root => {}
            Some(open_root) => {
                return Err(Error::Xml(format!(
                    "{} called while a <{}> document is open",
                    op, open_root
                )));
            }
            None => {
                return Err(Error::Xml(format!("{} called with no open document", op)));
            }
        }
        self.current
            .as_mut()
            .ok_or_else(|| Error::Xml(format!("{} called with no open document", op)))
    }
}

impl Default for SitemapWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Recursively encode one node as XML events
fn write_node<W: Write>(writer: &mut Writer<W>, node: &DocumentNode) -> Result<()> {
    match node {
        DocumentNode::Scalar(text) => {
            writer.write_event(Event::Text(BytesText::new(text)))?;
        }
        DocumentNode::List(items) => {
            for item in items {
                write_node(writer, item)?;
            }
        }
        DocumentNode::Element {
            name,
            namespace,
            attributes,
            body,
        } => {
            let tag = match namespace {
                Some(prefix) => format!("{}:{}", prefix, name),
                None => name.clone(),
            };
            let mut start = BytesStart::new(tag.as_str());
            for (attr_name, attr_value) in attributes {
                start.push_attribute((attr_name.as_str(), attr_value.as_str()));
            }

            match body {
                NodeBody::Empty => {
                    writer.write_event(Event::Empty(start))?;
                }
                NodeBody::Text(text) => {
                    writer.write_event(Event::Start(start))?;
                    writer.write_event(Event::Text(BytesText::new(text)))?;
                    writer.write_event(Event::End(BytesEnd::new(tag.as_str())))?;
                }
                NodeBody::Children(children) => {
                    writer.write_event(Event::Start(start))?;
                    for child in children {
                        write_node(writer, child)?;
                    }
                    writer.write_event(Event::End(BytesEnd::new(tag.as_str())))?;
                }
            }
        }
    }
    Ok(())
}

/// Trim whitespace from the end of a finished file.
///
/// Reads backward byte-by-byte from end-of-file and truncates at the
/// first non-whitespace byte.
fn trim_trailing_whitespace(path: &Path) -> Result<u64> {
    let mut file = OpenOptions::new().read(true).write(true).open(path)?;
    let mut len = file.metadata()?.len();
    let mut byte = [0u8; 1];

    while len > 0 {
        file.seek(SeekFrom::Start(len - 1))?;
        file.read_exact(&mut byte)?;
        if byte[0].is_ascii_whitespace() {
            len -= 1;
        } else {
            break;
        }
    }

    file.set_len(len)?;
    Ok(len)
}

use crate::outline::Node;
use anyhow::{Context, Result};
use log::debug;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Canonical file extension of a mind map package.
pub const XMIND_EXTENSION: &str = "xmind";

pub const CONTENT_ENTRY: &str = "content.xml";
pub const META_ENTRY: &str = "meta.xml";
pub const MANIFEST_ENTRY: &str = "META-INF/manifest.xml";

const CONTENT_NS: &str = "urn:xmind:xmap:xmlns:content:2.0";
const META_NS: &str = "urn:xmind:xmap:xmlns:meta:2.0";
const MANIFEST_NS: &str = "urn:xmind:xmap:xmlns:manifest:1.0";
const FORMAT_VERSION: &str = "2.0";
const SHEET_ID: &str = "sheet1";
// Logic chart growing to the right
const ROOT_STRUCTURE_CLASS: &str = "org.xmind.ui.logic.right";

/// Serializes an outline tree into an XMind package.
///
/// The package is a deflate-compressed ZIP archive with three entries:
/// `content.xml` (the topic tree), `meta.xml` and `META-INF/manifest.xml`.
/// Entries carry a fixed timestamp, so the same tree always yields the same
/// bytes.
pub struct XmindGenerator<'a> {
    root: &'a Node,
}

impl<'a> XmindGenerator<'a> {
    /// Creates a new `XmindGenerator`.
    ///
    /// # Arguments
    ///
    /// * `root` - The root of the topic tree; titles are expected to be escaped.
    pub fn new(root: &'a Node) -> Self {
        XmindGenerator { root }
    }

    /// Renders `content.xml`: one sheet whose top-level topic is the root node.
    pub fn content_xml(&self) -> Result<String> {
        let mut writer = xml_writer();
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        writer.write_event(Event::Start(
            BytesStart::new("xmap-content")
                .with_attributes([("xmlns", CONTENT_NS), ("version", FORMAT_VERSION)]),
        ))?;
        writer.write_event(Event::Start(
            BytesStart::new("sheet").with_attributes([("id", SHEET_ID)]),
        ))?;

        let root_id = self.root.id().to_string();
        let root_start = BytesStart::new("topic").with_attributes([
            ("id", root_id.as_str()),
            ("structure-class", ROOT_STRUCTURE_CLASS),
        ]);
        write_topic(&mut writer, self.root, root_start)?;

        writer.write_event(Event::End(BytesEnd::new("sheet")))?;
        writer.write_event(Event::End(BytesEnd::new("xmap-content")))?;
        finish_xml(writer)
    }

    /// Renders `meta.xml`, which carries nothing but the namespace and version.
    pub fn meta_xml(&self) -> Result<String> {
        let mut writer = xml_writer();
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        writer.write_event(Event::Start(
            BytesStart::new("meta").with_attributes([("xmlns", META_NS), ("version", FORMAT_VERSION)]),
        ))?;
        writer.write_event(Event::End(BytesEnd::new("meta")))?;
        finish_xml(writer)
    }

    /// Renders `META-INF/manifest.xml` listing the content and meta entries.
    pub fn manifest_xml(&self) -> Result<String> {
        let mut writer = xml_writer();
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        writer.write_event(Event::Start(
            BytesStart::new("manifest").with_attributes([("xmlns", MANIFEST_NS)]),
        ))?;
        for entry in [CONTENT_ENTRY, META_ENTRY] {
            writer.write_event(Event::Empty(
                BytesStart::new("file-entry")
                    .with_attributes([("full-path", entry), ("media-type", "text/xml")]),
            ))?;
        }
        writer.write_event(Event::End(BytesEnd::new("manifest")))?;
        finish_xml(writer)
    }

    /// Builds the whole package in memory.
    pub fn save_to_buffer(&self) -> Result<Vec<u8>> {
        let entries = [
            (CONTENT_ENTRY, self.content_xml()?),
            (META_ENTRY, self.meta_xml()?),
            (MANIFEST_ENTRY, self.manifest_xml()?),
        ];

        // Fixed DOS epoch timestamp keeps repeated runs byte-identical
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default());

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, xml) in &entries {
            zip.start_file(*name, options)?;
            zip.write_all(xml.as_bytes())?;
        }
        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }

    /// Writes the package to `destination`, replacing any existing file.
    ///
    /// The archive is fully assembled before the file is touched, so a
    /// failure while building it never leaves a truncated package behind.
    ///
    /// # Returns
    ///
    /// The path written to, or an error carrying `destination` as context.
    pub fn save(&self, destination: &Path) -> Result<PathBuf> {
        let buffer = self.save_to_buffer()?;
        fs::write(destination, &buffer)
            .with_context(|| format!("Failed to write {}", destination.display()))?;
        debug!(
            "wrote {} bytes ({} topics) to {}",
            buffer.len(),
            self.root.topic_count(),
            destination.display()
        );
        Ok(destination.to_path_buf())
    }
}

/// Writes `root` as an XMind package at `destination` and returns the written path.
pub fn emit(root: &Node, destination: &Path) -> Result<PathBuf> {
    XmindGenerator::new(root).save(destination)
}

fn xml_writer() -> Writer<Vec<u8>> {
    Writer::new_with_indent(Vec::new(), b' ', 2)
}

fn finish_xml(writer: Writer<Vec<u8>>) -> Result<String> {
    Ok(String::from_utf8(writer.into_inner())?)
}

fn write_topic(writer: &mut Writer<Vec<u8>>, node: &Node, start: BytesStart<'_>) -> Result<()> {
    writer.write_event(Event::Start(start))?;
    writer.write_event(Event::Start(BytesStart::new("title")))?;
    // Titles are escaped when the outline is parsed
    writer.write_event(Event::Text(BytesText::from_escaped(node.title())))?;
    writer.write_event(Event::End(BytesEnd::new("title")))?;
    write_children(writer, node.children())?;
    writer.write_event(Event::End(BytesEnd::new("topic")))?;
    Ok(())
}

/// Leaves get no `<children>` block at all.
fn write_children(writer: &mut Writer<Vec<u8>>, children: &[Node]) -> Result<()> {
    if children.is_empty() {
        return Ok(());
    }

    writer.write_event(Event::Start(BytesStart::new("children")))?;
    writer.write_event(Event::Start(
        BytesStart::new("topics").with_attributes([("type", "attached")]),
    ))?;
    for child in children {
        let id = child.id().to_string();
        let start = BytesStart::new("topic").with_attributes([("id", id.as_str())]);
        write_topic(writer, child, start)?;
    }
    writer.write_event(Event::End(BytesEnd::new("topics")))?;
    writer.write_event(Event::End(BytesEnd::new("children")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::tab_outline::{OutlineParser, OutlineParserOptions};
    use quick_xml::Reader;
    use std::io::Read;
    use tempfile::tempdir;
    use zip::ZipArchive;

    fn parse(input: &str) -> Node {
        OutlineParser::new(OutlineParserOptions::default())
            .parse(input)
            .unwrap()
    }

    /// Collects the `id` attribute of every `<topic>` start tag, in document order.
    fn topic_ids(xml: &str) -> Vec<String> {
        let mut reader = Reader::from_str(xml);
        let mut ids = Vec::new();
        loop {
            match reader.read_event().unwrap() {
                Event::Eof => break,
                Event::Start(e) if e.name().as_ref() == b"topic" => {
                    let attr = e.try_get_attribute("id").unwrap().unwrap();
                    ids.push(String::from_utf8(attr.value.into_owned()).unwrap());
                }
                _ => (),
            }
        }
        ids
    }

    fn read_entry(archive: &mut ZipArchive<Cursor<Vec<u8>>>, name: &str) -> String {
        let mut content = String::new();
        archive
            .by_name(name)
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        content
    }

    #[test]
    fn test_content_xml_structure() {
        let root = parse("Login\n\tEnter valid credentials\n\tEnter invalid credentials\n\t\tShow error message");
        let xml = XmindGenerator::new(&root).content_xml().unwrap();

        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(
            r#"<xmap-content xmlns="urn:xmind:xmap:xmlns:content:2.0" version="2.0">"#
        ));
        assert!(xml.contains(r#"<sheet id="sheet1">"#));
        assert!(xml.contains(
            r#"<topic id="topic1" structure-class="org.xmind.ui.logic.right">"#
        ));
        assert!(xml.contains("<title>测试用例</title>"));
        assert!(xml.contains("<title>Show error message</title>"));

        assert_eq!(
            topic_ids(&xml),
            vec!["topic1", "topic2", "topic3", "topic4", "topic5"]
        );
        // root, Login and "Enter invalid credentials" have children
        assert_eq!(xml.matches("<children>").count(), 3);
        assert_eq!(xml.matches(r#"<topics type="attached">"#).count(), 3);
    }

    #[test]
    fn test_content_xml_topic_count_matches_lines() {
        let input = "A\n\tB\n\n\t\tC\n\t\t\t\tD\nE\n  \n\tF\n";
        let root = parse(input);
        let xml = XmindGenerator::new(&root).content_xml().unwrap();

        let non_blank = input.lines().filter(|l| !l.trim().is_empty()).count();
        assert_eq!(topic_ids(&xml).len(), non_blank + 1);
    }

    #[test]
    fn test_content_xml_escaped_once() {
        let root = parse(r#"a&b <c> "d" 'e'"#);
        let xml = XmindGenerator::new(&root).content_xml().unwrap();

        assert!(xml.contains("<title>a&amp;b &lt;c&gt; &quot;d&quot; &apos;e&apos;</title>"));
        assert!(!xml.contains("&amp;amp;"));
        assert!(!xml.contains("&amp;lt;"));
    }

    #[test]
    fn test_content_xml_empty_outline() {
        let root = parse("");
        let xml = XmindGenerator::new(&root).content_xml().unwrap();

        assert_eq!(topic_ids(&xml), vec!["topic1"]);
        assert!(!xml.contains("<children>"));
        assert!(!xml.contains("<topics"));
    }

    #[test]
    fn test_meta_and_manifest_xml() {
        let root = parse("A");
        let generator = XmindGenerator::new(&root);

        let meta = generator.meta_xml().unwrap();
        assert!(meta.contains(r#"<meta xmlns="urn:xmind:xmap:xmlns:meta:2.0" version="2.0">"#));
        assert!(meta.contains("</meta>"));

        let manifest = generator.manifest_xml().unwrap();
        assert!(manifest.contains(r#"<manifest xmlns="urn:xmind:xmap:xmlns:manifest:1.0">"#));
        assert!(manifest.contains(
            r#"<file-entry full-path="content.xml" media-type="text/xml"/>"#
        ));
        assert!(manifest.contains(
            r#"<file-entry full-path="meta.xml" media-type="text/xml"/>"#
        ));
        assert_eq!(manifest.matches("<file-entry").count(), 2);

        // fixed documents do not depend on the tree
        let other = parse("X\n\tY\n\tZ");
        assert_eq!(XmindGenerator::new(&other).meta_xml().unwrap(), meta);
        assert_eq!(XmindGenerator::new(&other).manifest_xml().unwrap(), manifest);
    }

    #[test]
    fn test_save_to_buffer_entries() {
        let root = parse("A\n\tB");
        let generator = XmindGenerator::new(&root);
        let buffer = generator.save_to_buffer().unwrap();

        let mut archive = ZipArchive::new(Cursor::new(buffer)).unwrap();
        assert_eq!(archive.len(), 3);

        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert_eq!(names, vec![CONTENT_ENTRY, META_ENTRY, MANIFEST_ENTRY]);

        for i in 0..archive.len() {
            assert_eq!(
                archive.by_index(i).unwrap().compression(),
                CompressionMethod::Deflated
            );
        }

        assert_eq!(
            read_entry(&mut archive, CONTENT_ENTRY),
            generator.content_xml().unwrap()
        );
        assert_eq!(
            read_entry(&mut archive, MANIFEST_ENTRY),
            generator.manifest_xml().unwrap()
        );
    }

    #[test]
    fn test_save_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cases.xmind");
        let root = parse("Login\n\tOK\n\tNG\n\t\tError");

        emit(&root, &path).unwrap();
        let first = fs::read(&path).unwrap();

        let again = parse("Login\n\tOK\n\tNG\n\t\tError");
        let written = emit(&again, &path).unwrap();
        let second = fs::read(&path).unwrap();

        assert_eq!(written, path);
        assert_eq!(first, second);
    }

    #[test]
    fn test_save_overwrites_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.xmind");
        fs::write(&path, b"not an archive").unwrap();

        emit(&parse("A"), &path).unwrap();

        let archive = ZipArchive::new(fs::File::open(&path).unwrap()).unwrap();
        assert_eq!(archive.len(), 3);
    }

    #[test]
    fn test_save_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("out.xmind");

        let err = emit(&parse("A"), &path).unwrap_err();
        assert!(err.to_string().contains("Failed to write"));
        assert!(err.downcast_ref::<std::io::Error>().is_some());
        assert!(!path.exists());
    }
}

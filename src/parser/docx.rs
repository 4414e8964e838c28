use crate::document::{Block, Cell, Document, Paragraph, Run, Table, VerticalAlign};
use anyhow::Context;
use log::{debug, warn};
use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use thiserror::Error;
use zip::result::ZipError;
use zip::ZipArchive;

const DOCUMENT_PART: &str = "word/document.xml";
const STYLES_PART: &str = "word/styles.xml";

/// Errors raised while reading a `.docx` package.
#[derive(Error, Debug)]
pub enum DocxError {
    #[error("not a valid docx package: {0}")]
    Zip(#[from] ZipError),
    #[error("docx package has no {0} part")]
    MissingPart(&'static str),
    #[error("failed to read docx part: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed XML at position {position}: {source}")]
    Xml {
        position: u64,
        source: quick_xml::Error,
    },
    #[error("malformed XML attribute: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),
    #[error("malformed XML escape: {0}")]
    Escape(#[from] quick_xml::escape::EscapeError),
    #[error("XML text is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

/// Reads the body of a WordprocessingML document into a [`Document`].
#[derive(Debug, Default)]
pub struct DocxParser;

impl DocxParser {
    pub fn new() -> Self {
        DocxParser
    }

    /// Opens and parses a `.docx` file.
    pub fn parse_file(&self, path: &Path) -> anyhow::Result<Document> {
        let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        self.parse_reader(BufReader::new(file))
            .with_context(|| format!("Failed to read {}", path.display()))
    }

    /// Parses a `.docx` package from any seekable reader.
    pub fn parse_reader<R: Read + Seek>(&self, reader: R) -> Result<Document, DocxError> {
        let mut archive = ZipArchive::new(reader)?;
        let document_xml = read_part(&mut archive, DOCUMENT_PART)?
            .ok_or(DocxError::MissingPart(DOCUMENT_PART))?;
        let styles_xml = read_part(&mut archive, STYLES_PART)?;
        if styles_xml.is_none() {
            debug!("no {} part, style ids are used as names", STYLES_PART);
        }
        self.parse_parts(&document_xml, styles_xml.as_deref())
    }

    /// Parses the XML of the main document part, resolving paragraph style
    /// names from the styles part when one is given.
    ///
    /// # Arguments
    ///
    /// * `document_xml` - The content of `word/document.xml`.
    /// * `styles_xml` - The content of `word/styles.xml`, if the package has one.
    ///
    /// # Returns
    ///
    /// The body blocks in document order, or a `DocxError` for malformed XML.
    pub fn parse_parts(
        &self,
        document_xml: &str,
        styles_xml: Option<&str>,
    ) -> Result<Document, DocxError> {
        let styles = match styles_xml {
            Some(xml) => parse_style_names(xml)?,
            None => HashMap::new(),
        };

        let mut reader = Reader::from_str(document_xml);
        let mut body = BodyBuilder::new(&styles);

        loop {
            let event = reader.read_event().map_err(|source| DocxError::Xml {
                position: reader.buffer_position() as u64,
                source,
            })?;
            match event {
                Event::Eof => break,
                Event::Start(ref e) => body.start(e, false)?,
                Event::Empty(ref e) => body.start(e, true)?,
                Event::End(ref e) => body.end(e.name().as_ref()),
                Event::Text(ref t) => {
                    let raw = std::str::from_utf8(t)?;
                    body.text(&unescape(raw)?);
                }
                Event::GeneralRef(ref r) => {
                    if let Some(ch) = r.resolve_char_ref().map_err(|source| DocxError::Xml {
                        position: reader.buffer_position() as u64,
                        source,
                    })? {
                        body.text(ch.encode_utf8(&mut [0; 4]));
                    } else {
                        let name = std::str::from_utf8(r)?;
                        match resolve_predefined_entity(name) {
                            Some(resolved) => body.text(resolved),
                            None => warn!("ignoring unknown entity &{};", name),
                        }
                    }
                }
                _ => (),
            }
        }

        let document = body.finish();
        debug!("parsed docx body with {} blocks", document.blocks.len());
        Ok(document)
    }
}

/// Reads a part of the package as text; `None` when the part is absent.
fn read_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<String>, DocxError> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    Ok(Some(content))
}

/// Maps style ids to their display names.
fn parse_style_names(xml: &str) -> Result<HashMap<String, String>, DocxError> {
    let mut reader = Reader::from_str(xml);
    let mut names = HashMap::new();
    let mut current_id: Option<String> = None;

    loop {
        let event = reader.read_event().map_err(|source| DocxError::Xml {
            position: reader.buffer_position() as u64,
            source,
        })?;
        match event {
            Event::Eof => break,
            Event::Start(ref e) if e.name().as_ref() == b"w:style" => {
                current_id = attr_value(e, "w:styleId")?;
            }
            Event::Empty(ref e) if e.name().as_ref() == b"w:name" => {
                if let (Some(id), Some(name)) = (&current_id, attr_value(e, "w:val")?) {
                    names.insert(id.clone(), name);
                }
            }
            Event::End(ref e) if e.name().as_ref() == b"w:style" => current_id = None,
            _ => (),
        }
    }

    Ok(names)
}

fn attr_value(e: &BytesStart, name: &str) -> Result<Option<String>, DocxError> {
    match e.try_get_attribute(name)? {
        Some(attr) => {
            let raw = std::str::from_utf8(&attr.value)?;
            Ok(Some(unescape(raw)?.into_owned()))
        }
        None => Ok(None),
    }
}

/// Toggle properties are on unless explicitly switched off.
fn toggle_value(e: &BytesStart) -> Result<bool, DocxError> {
    Ok(!matches!(
        attr_value(e, "w:val")?.as_deref(),
        Some("0" | "false" | "off")
    ))
}

#[derive(Default)]
struct TableBuilder {
    rows: Vec<Vec<Cell>>,
    row: Option<Vec<Cell>>,
    cell: Option<Cell>,
    span: usize,
}

/// Streaming state while walking `w:body`.
struct BodyBuilder<'s> {
    styles: &'s HashMap<String, String>,
    blocks: Vec<Block>,
    // innermost table last
    tables: Vec<TableBuilder>,
    paragraph: Option<Paragraph>,
    run: Option<Run>,
    in_paragraph_props: bool,
    in_run_props: bool,
    in_text: bool,
    // depth inside an ignored subtree (drawings, embedded objects, block content controls)
    skip: usize,
}

impl<'s> BodyBuilder<'s> {
    fn new(styles: &'s HashMap<String, String>) -> Self {
        BodyBuilder {
            styles,
            blocks: Vec::new(),
            tables: Vec::new(),
            paragraph: None,
            run: None,
            in_paragraph_props: false,
            in_run_props: false,
            in_text: false,
            skip: 0,
        }
    }

    fn start(&mut self, e: &BytesStart, empty: bool) -> Result<(), DocxError> {
        if self.skip > 0 {
            if !empty {
                self.skip += 1;
            }
            return Ok(());
        }

        match e.name().as_ref() {
            b"w:drawing" | b"w:pict" | b"w:object" | b"mc:AlternateContent" => {
                if !empty {
                    self.skip = 1;
                }
            }
            // Block-level content controls (generated tables of contents and the
            // like) are not body paragraphs; inline ones inside a paragraph are kept.
            b"w:sdt" if !empty && self.paragraph.is_none() => self.skip = 1,
            b"w:tbl" if !empty => self.tables.push(TableBuilder::default()),
            b"w:tr" if !empty => {
                if let Some(table) = self.tables.last_mut() {
                    table.row = Some(Vec::new());
                }
            }
            b"w:tc" if !empty => {
                if let Some(table) = self.tables.last_mut() {
                    table.cell = Some(Cell::default());
                    table.span = 1;
                }
            }
            b"w:gridSpan" => {
                let span = attr_value(e, "w:val")?.and_then(|v| v.parse::<usize>().ok());
                if let (Some(table), Some(span)) = (self.tables.last_mut(), span) {
                    table.span = span.max(1);
                }
            }
            b"w:p" if !empty => self.paragraph = Some(Paragraph::default()),
            b"w:pPr" if !empty => self.in_paragraph_props = true,
            b"w:pStyle" if self.in_paragraph_props => {
                if let (Some(paragraph), Some(id)) = (self.paragraph.as_mut(), attr_value(e, "w:val")?) {
                    let name = self.styles.get(&id).cloned().unwrap_or(id);
                    paragraph.style_name = Some(name);
                }
            }
            b"w:numPr" if self.in_paragraph_props => {
                if let Some(paragraph) = self.paragraph.as_mut() {
                    paragraph.numbered = true;
                }
            }
            b"w:r" if !empty && self.paragraph.is_some() => self.run = Some(Run::default()),
            b"w:rPr" if !empty => self.in_run_props = true,
            b"w:t" if !empty => self.in_text = true,
            _ => self.run_property_or_content(e)?,
        }
        Ok(())
    }

    /// Character properties and special characters of the open run.
    fn run_property_or_content(&mut self, e: &BytesStart) -> Result<(), DocxError> {
        let in_run_props = self.in_run_props;
        let Some(run) = self.run.as_mut() else {
            return Ok(());
        };

        match e.name().as_ref() {
            b"w:b" if in_run_props => run.bold = toggle_value(e)?,
            b"w:i" if in_run_props => run.italic = toggle_value(e)?,
            b"w:strike" if in_run_props => run.strike = toggle_value(e)?,
            b"w:u" if in_run_props => {
                // a bare `<w:u/>` carries no underline type and does not underline
                run.underline = matches!(attr_value(e, "w:val")?.as_deref(), Some(v) if v != "none");
            }
            b"w:vertAlign" if in_run_props => {
                run.vertical_align = match attr_value(e, "w:val")?.as_deref() {
                    Some("superscript") => VerticalAlign::Superscript,
                    Some("subscript") => VerticalAlign::Subscript,
                    _ => VerticalAlign::Baseline,
                };
            }
            b"w:tab" if !in_run_props => run.text.push('\t'),
            b"w:br" | b"w:cr" if !in_run_props => run.text.push('\n'),
            _ => (),
        }
        Ok(())
    }

    fn end(&mut self, name: &[u8]) {
        if self.skip > 0 {
            self.skip -= 1;
            return;
        }

        match name {
            b"w:t" => self.in_text = false,
            b"w:rPr" => self.in_run_props = false,
            b"w:pPr" => self.in_paragraph_props = false,
            b"w:r" => {
                if let (Some(run), Some(paragraph)) = (self.run.take(), self.paragraph.as_mut()) {
                    paragraph.runs.push(run);
                }
            }
            b"w:p" => {
                if let Some(paragraph) = self.paragraph.take() {
                    self.finish_paragraph(paragraph);
                }
            }
            b"w:tc" => {
                if let Some(table) = self.tables.last_mut() {
                    if let (Some(cell), Some(row)) = (table.cell.take(), table.row.as_mut()) {
                        for _ in 1..table.span {
                            row.push(cell.clone());
                        }
                        row.push(cell);
                    }
                }
            }
            b"w:tr" => {
                if let Some(table) = self.tables.last_mut() {
                    if let Some(row) = table.row.take() {
                        table.rows.push(row);
                    }
                }
            }
            b"w:tbl" => {
                if let Some(table) = self.tables.pop() {
                    // Nested tables are dropped; only top-level tables become blocks
                    if self.tables.is_empty() {
                        self.blocks.push(Block::Table(Table { rows: table.rows }));
                    }
                }
            }
            _ => (),
        }
    }

    fn text(&mut self, text: &str) {
        if !self.in_text || self.skip > 0 {
            return;
        }
        if let Some(run) = self.run.as_mut() {
            run.text.push_str(text);
        }
    }

    fn finish_paragraph(&mut self, paragraph: Paragraph) {
        match self.tables.last_mut() {
            None => self.blocks.push(Block::Paragraph(paragraph)),
            Some(table) => {
                if let Some(cell) = table.cell.as_mut() {
                    cell.paragraphs.push(paragraph);
                }
            }
        }
    }

    fn finish(self) -> Document {
        Document {
            blocks: self.blocks,
        }
    }
}

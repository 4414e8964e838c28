//! In-memory model of a word-processing document.
//!
//! Only what the Markdown output needs is kept: the top-level sequence of
//! paragraphs and tables, paragraph style and numbering, and the character
//! formatting of each run.

/// Vertical position of a run relative to the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerticalAlign {
    #[default]
    Baseline,
    Superscript,
    Subscript,
}

/// A span of text sharing one set of character properties.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Run {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike: bool,
    pub vertical_align: VerticalAlign,
}

impl Run {
    /// Creates an unformatted run.
    pub fn plain(text: &str) -> Self {
        Run {
            text: text.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Paragraph {
    /// Display name of the paragraph style (e.g. "heading 1"), if any.
    pub style_name: Option<String>,
    /// True when the paragraph carries list numbering properties.
    pub numbered: bool,
    pub runs: Vec<Run>,
}

impl Paragraph {
    /// Concatenated text of all runs, without formatting.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// A table cell holds its own paragraphs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cell {
    pub paragraphs: Vec<Paragraph>,
}

/// Rows of cells, one cell per grid column.
///
/// A cell spanning several grid columns is repeated once per column it covers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    pub rows: Vec<Vec<Cell>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

/// Body content in document order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    pub blocks: Vec<Block>,
}

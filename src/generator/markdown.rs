use crate::document::{Block, Cell, Document, Paragraph, Run, Table, VerticalAlign};
use anyhow::{Context, Result};
use log::debug;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

const BULLETS: [char; 7] = ['•', '·', '○', '■', '▪', '-', '*'];

/// Markdown has no heading deeper than `######`.
const MAX_HEADING_LEVEL: usize = 6;

/// Options for configuring the `MarkdownGenerator`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownGeneratorOptions {
    /// If true, run formatting (bold, italic, ...) is rendered as Markdown/HTML markup.
    pub preserve_formatting: bool,
}

impl Default for MarkdownGeneratorOptions {
    fn default() -> Self {
        MarkdownGeneratorOptions {
            preserve_formatting: true,
        }
    }
}

struct Patterns {
    number: Regex,
    ordered_marker: Regex,
    letter_marker: Regex,
    strip_bullet: Regex,
    strip_ordered: Regex,
    strip_letter: Regex,
}

impl Patterns {
    fn new() -> Result<Self> {
        Ok(Patterns {
            number: Regex::new(r"(\d+)")?,
            ordered_marker: Regex::new(r"^\d+\.")?,
            letter_marker: Regex::new(r"^[a-zA-Z]\.")?,
            strip_bullet: Regex::new(r"^[•·○■▪\-\*]\s*")?,
            strip_ordered: Regex::new(r"^\d+\.\s*")?,
            strip_letter: Regex::new(r"^[a-zA-Z]\.\s*")?,
        })
    }
}

/// Renders a [`Document`] as Markdown.
///
/// Headings come from the paragraph style name, list items from numbering
/// properties or a leading bullet/number marker, and tables are written as
/// pipe tables whose first row is the header.
pub struct MarkdownGenerator<'a> {
    document: &'a Document,
    options: MarkdownGeneratorOptions,
}

impl<'a> MarkdownGenerator<'a> {
    /// Creates a new `MarkdownGenerator`.
    ///
    /// # Arguments
    ///
    /// * `document` - The parsed document to render.
    /// * `options` - The `MarkdownGeneratorOptions` to configure the output.
    pub fn new(document: &'a Document, options: MarkdownGeneratorOptions) -> Self {
        MarkdownGenerator { document, options }
    }

    /// Produces the output lines, blank separators included.
    pub fn lines(&self) -> Result<Vec<String>> {
        let patterns = Patterns::new()?;
        let mut lines = Vec::new();

        for block in &self.document.blocks {
            match block {
                Block::Paragraph(paragraph) => self.paragraph(&patterns, paragraph, &mut lines),
                Block::Table(table) => self.table(table, &mut lines),
            }
        }

        Ok(lines)
    }

    /// Produces the whole Markdown text.
    pub fn output(&self) -> Result<String> {
        Ok(self.lines()?.join("\n"))
    }

    /// Writes the Markdown text to `path`, replacing any existing file.
    pub fn save(&self, path: &Path) -> Result<PathBuf> {
        let markdown = self.output()?;
        fs::write(path, markdown.as_bytes())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        debug!("wrote {} bytes to {}", markdown.len(), path.display());
        Ok(path.to_path_buf())
    }

    fn paragraph(&self, patterns: &Patterns, paragraph: &Paragraph, lines: &mut Vec<String>) {
        if let Some(level) = heading_level(patterns, paragraph) {
            let text = self.formatted_text(paragraph);
            let text = text.trim();
            if !text.is_empty() {
                lines.push(format!("{} {}", "#".repeat(level), text));
                lines.push(String::new());
            }
        } else if is_list_item(patterns, paragraph) {
            self.list_item(patterns, paragraph, lines);
        } else {
            let text = self.formatted_text(paragraph);
            if !text.trim().is_empty() {
                lines.push(text);
                lines.push(String::new());
            }
        }
    }

    fn list_item(&self, patterns: &Patterns, paragraph: &Paragraph, lines: &mut Vec<String>) {
        let text = self.formatted_text(paragraph);
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        let ordered = paragraph.numbered || patterns.ordered_marker.is_match(text);

        let cleaned = patterns.strip_bullet.replace(text, "");
        let cleaned = patterns.strip_ordered.replace(&cleaned, "");
        let cleaned = patterns.strip_letter.replace(&cleaned, "");

        if ordered {
            lines.push(format!("1. {}", cleaned));
        } else {
            lines.push(format!("- {}", cleaned));
        }
    }

    fn table(&self, table: &Table, lines: &mut Vec<String>) {
        let Some((header_row, body_rows)) = table.rows.split_first() else {
            return;
        };

        let mut rendered = Vec::new();

        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| self.cell_text(cell).trim().to_string())
            .collect();
        if !headers.is_empty() {
            rendered.push(format!("| {} |", headers.join(" | ")));
            rendered.push(format!("| {} |", vec!["---"; headers.len()].join(" | ")));
        }

        for row in body_rows {
            let cells: Vec<String> = row
                .iter()
                .map(|cell| self.cell_text(cell).replace('\n', "<br>").trim().to_string())
                .collect();
            if !cells.is_empty() {
                rendered.push(format!("| {} |", cells.join(" | ")));
            }
        }

        if !rendered.is_empty() {
            lines.extend(rendered);
            lines.push(String::new());
        }
    }

    /// Non-blank paragraphs of the cell, each trimmed, joined by a space.
    fn cell_text(&self, cell: &Cell) -> String {
        cell.paragraphs
            .iter()
            .map(|p| self.formatted_text(p))
            .filter(|t| !t.trim().is_empty())
            .map(|t| t.trim().to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn formatted_text(&self, paragraph: &Paragraph) -> String {
        paragraph
            .runs
            .iter()
            .filter(|run| !run.text.is_empty())
            .map(|run| self.formatted_run(run))
            .collect()
    }

    fn formatted_run(&self, run: &Run) -> String {
        let mut text = run.text.clone();
        if !self.options.preserve_formatting {
            return text;
        }

        if run.bold {
            text = format!("**{}**", text);
        }
        if run.italic {
            text = format!("*{}*", text);
        }
        if run.underline {
            text = format!("<u>{}</u>", text);
        }
        if run.strike {
            text = format!("~~{}~~", text);
        }
        match run.vertical_align {
            VerticalAlign::Superscript => format!("<sup>{}</sup>", text),
            VerticalAlign::Subscript => format!("<sub>{}</sub>", text),
            VerticalAlign::Baseline => text,
        }
    }
}

/// Heading level from the style name ("heading 2", "标题 3"); `None` for other paragraphs.
///
/// The level is clamped to `1..=6`, so odd names like "heading 0" or
/// "heading 99" still give a valid Markdown heading.
fn heading_level(patterns: &Patterns, paragraph: &Paragraph) -> Option<usize> {
    let style_name = paragraph.style_name.as_deref()?.to_lowercase();
    if !(style_name.contains("heading") || style_name.starts_with("标题")) {
        return None;
    }

    let level = patterns
        .number
        .captures(&style_name)
        // digits too long for usize are just a very deep level
        .map(|c| c[1].parse::<usize>().unwrap_or(usize::MAX))
        .unwrap_or(1);
    Some(level.clamp(1, MAX_HEADING_LEVEL))
}

fn is_list_item(patterns: &Patterns, paragraph: &Paragraph) -> bool {
    if paragraph.numbered {
        return true;
    }

    let text = paragraph.text();
    let text = text.trim();
    if text.is_empty() {
        return false;
    }

    text.starts_with(&BULLETS[..])
        || patterns.ordered_marker.is_match(text)
        || patterns.letter_marker.is_match(text)
}

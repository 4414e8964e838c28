//! Detailed documentation for input and output types.
//!
//! This module contains documentation about the formats read and written by
//! the two command line tools, `xmind-conv-rs` and `docx2md`.

/// # Types of Input
///
/// ## Tab-indented outline (`xmind-conv-rs`)
///
/// A UTF-8 text file consisting of multiple lines where:
/// - `<line> ::= { <tab> } <title>`
/// - `<title>` : the rest of the line, surrounding whitespace trimmed.
/// - blank (whitespace-only) lines are skipped.
///
/// The number of leading tabs is the depth of the entry. An entry is placed
/// under the nearest preceding entry of smaller depth; skipping levels is
/// allowed and does not create placeholder entries. Characters such as `&`
/// or `<` are plain text.
///
/// ## Word document (`docx2md`)
///
/// An Office Open XML `.docx` package. Paragraphs, tables, paragraph styles,
/// list numbering and run formatting are read; images and other drawings are
/// ignored.
pub mod input_types {
    /// Documentation for the tab-indented outline input format
    pub mod tab_outline {
        //! Tab-indented outline parser
    }

    /// Documentation for the docx input format
    pub mod docx {
        //! Word document reader
    }
}

/// # Types of Output
///
/// The sample input used in this section is as follows:
///
/// ```text
/// Login
/// 	Enter valid credentials
/// 	Enter invalid credentials
/// 		Show error message
/// ```
///
/// ## `xmind`
///
/// A deflate-compressed ZIP package with three entries:
///
/// - `content.xml` : one sheet whose top-level topic is the root
///   (`测试用例` unless `--root-title` is given). Each entry becomes a
///   `<topic id="topicN">` with a `<title>`; children are nested in
///   `<children><topics type="attached">`. The sample yields five topics.
/// - `meta.xml` : namespace and version only.
/// - `META-INF/manifest.xml` : lists `content.xml` and `meta.xml`.
///
/// Converting the same input twice produces identical files.
///
/// ## `markdown`
///
/// - headings (`heading N` / `标题 N` styles) : `#` repeated N times
/// - list items : `- item`, or `1. item` for numbered lists
/// - tables : pipe tables, first row as header
/// - run formatting : `**bold**`, `*italic*`, `<u>`, `~~strike~~`, `<sup>`, `<sub>`
///   (disabled by `--no-formatting`)
pub mod output_types {
    /// Documentation for the xmind output format
    pub mod xmind {
        //! XMind mind map package
    }

    /// Documentation for the markdown output format
    pub mod markdown {
        //! Markdown text
    }
}

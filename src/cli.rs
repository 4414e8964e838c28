//! Conversion runners shared by the command line tools.

use anyhow::{Context, Result};
use log::{info, LevelFilter};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::generator::markdown::{MarkdownGenerator, MarkdownGeneratorOptions};
use crate::generator::xmind::{emit, XMIND_EXTENSION};
use crate::parser::docx::DocxParser;
use crate::parser::tab_outline::{OutlineParser, OutlineParserOptions};

/// Default directory for Markdown output.
pub const DEFAULT_MARKDOWN_DIR: &str = "output";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CliError {
    #[error("Input file '{}' does not exist", .0.display())]
    InputNotFound(PathBuf),
}

/// Sets up `env_logger` on stderr; `RUST_LOG` still takes precedence per module.
pub fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init();
}

fn ensure_input_exists(input: &Path) -> Result<()> {
    if !input.exists() {
        return Err(CliError::InputNotFound(input.to_path_buf()).into());
    }
    Ok(())
}

/// `<dir>/<stem>.xmind` next to the input file.
pub fn default_xmind_output(input: &Path) -> PathBuf {
    input.with_extension(XMIND_EXTENSION)
}

/// Converts a tab-indented outline file into an XMind package.
///
/// # Arguments
///
/// * `input` - The outline text file.
/// * `output` - The package path; defaults to `input` with an `.xmind` extension.
/// * `options` - Parser options such as the root title.
///
/// # Returns
///
/// The path of the written package.
pub fn run_xmind_conversion(
    input: &Path,
    output: Option<&Path>,
    options: OutlineParserOptions,
) -> Result<PathBuf> {
    ensure_input_exists(input)?;
    info!("converting outline {}", input.display());

    let text = fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let root = OutlineParser::new(options).parse(&text)?;

    let destination = match output {
        Some(path) => path.to_path_buf(),
        None => default_xmind_output(input),
    };
    let written = emit(&root, &destination)?;
    info!(
        "wrote {} topics to {}",
        root.topic_count(),
        written.display()
    );
    Ok(written)
}

/// `<stem>.md` for the given input file.
///
/// Only the last extension is replaced, so `spec.v2.docx` gives `spec.v2.md`.
pub fn default_markdown_name(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or(input.as_os_str());
    let mut name = stem.to_os_string();
    name.push(".md");
    PathBuf::from(name)
}

/// Converts a `.docx` file into Markdown written to `output_dir/output_name`.
///
/// The output directory is created if missing.
pub fn run_markdown_conversion(
    input: &Path,
    output_name: Option<&Path>,
    output_dir: &Path,
    options: MarkdownGeneratorOptions,
) -> Result<PathBuf> {
    ensure_input_exists(input)?;
    info!("converting document {}", input.display());

    let document = DocxParser::new().parse_file(input)?;

    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;
    let name = match output_name {
        Some(name) => name.to_path_buf(),
        None => default_markdown_name(input),
    };
    let written = MarkdownGenerator::new(&document, options).save(&output_dir.join(name))?;
    info!("wrote {}", written.display());
    Ok(written)
}

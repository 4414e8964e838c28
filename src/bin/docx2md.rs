use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use xmind_conv_rs::cli::{init_logging, run_markdown_conversion, DEFAULT_MARKDOWN_DIR};
use xmind_conv_rs::generator::markdown::MarkdownGeneratorOptions;

/// Convert a Word document (.docx) into Markdown.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input Word document
    input: PathBuf,

    /// Output file name (default: <input stem>.md)
    #[arg(short = 'o', long, value_name = "NAME")]
    output: Option<PathBuf>,

    /// Output directory, created if missing
    #[arg(short = 'd', long, value_name = "DIR", default_value = DEFAULT_MARKDOWN_DIR)]
    output_dir: PathBuf,

    /// Drop bold/italic/underline/strike/sup/sub markup
    #[arg(long)]
    no_formatting: bool,

    /// Enable debug logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let options = MarkdownGeneratorOptions {
        preserve_formatting: !cli.no_formatting,
    };

    match run_markdown_conversion(&cli.input, cli.output.as_deref(), &cli.output_dir, options) {
        Ok(path) => {
            println!("Converted: {}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{:#}", e);
            println!("Conversion failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

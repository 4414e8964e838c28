use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use xmind_conv_rs::cli::{init_logging, run_xmind_conversion};
use xmind_conv_rs::parser::tab_outline::{OutlineParserOptions, DEFAULT_ROOT_TITLE};

/// Convert a tab-indented outline into an XMind mind map.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input outline file (UTF-8, one entry per line, indented with tabs)
    input: PathBuf,

    /// Output file (default: <input dir>/<input stem>.xmind)
    #[arg(short = 'o', long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Title of the root topic
    #[arg(long, default_value = DEFAULT_ROOT_TITLE)]
    root_title: String,

    /// Enable debug logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let options = OutlineParserOptions {
        root_title: cli.root_title,
    };

    match run_xmind_conversion(&cli.input, cli.output.as_deref(), options) {
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

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use larder_ocr::{ParserConfig, ReceiptInput, ReceiptParser, SourceMode};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "larder")]
#[command(about = "Turn receipt OCR output into structured line items")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse one receipt and print the extraction as JSON
    #[command(after_help = "\
INPUT may be plain OCR text or a JSON document {\"text\": ..., \"pages\": [...]}.
Diagnostics go to stderr; set RUST_LOG=larder_ocr=debug to see stage decisions.")]
    Parse {
        /// OCR text or JSON input file; `-` or omitted reads stdin
        input: Option<PathBuf>,

        /// JSON file with word geometry (`pages`) to pair with the text
        #[arg(long, value_name = "FILE")]
        geometry: Option<PathBuf>,

        /// Parser settings (TOML)
        #[arg(long, value_name = "FILE", env = "LARDER_CONFIG")]
        config: Option<PathBuf>,

        /// Override the configured source: text, geo or auto
        #[arg(long, value_name = "MODE")]
        source: Option<SourceMode>,

        /// Single-line JSON
        #[arg(long)]
        compact: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Parse { input, geometry, config, source, compact } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(mode) = source {
                config.source_mode = mode;
            }
            let content = read_source(input.as_deref())?;
            let geometry = geometry
                .map(|p| std::fs::read_to_string(&p).with_context(|| format!("Failed to read {}", p.display())))
                .transpose()?;
            let input = build_input(&content, geometry.as_deref())?;

            let result = ReceiptParser::new(config).parse(&input);
            tracing::info!(items = result.lines.len(), needs_review = result.needs_review, "parsed");

            let json = if compact {
                serde_json::to_string(&result)?
            } else {
                serde_json::to_string_pretty(&result)?
            };
            println!("{json}");
        }
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<ParserConfig> {
    let Some(path) = path else {
        return Ok(ParserConfig::default());
    };
    let content = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    ParserConfig::from_toml(&content).with_context(|| format!("Invalid config {}", path.display()))
}

fn read_source(path: Option<&Path>) -> Result<String> {
    match path {
        Some(p) if p != Path::new("-") => {
            std::fs::read_to_string(p).with_context(|| format!("Failed to read {}", p.display()))
        }
        _ => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).context("Failed to read stdin")?;
            Ok(buf)
        }
    }
}

/// A `{`-led document is the JSON form; anything else is linear OCR text.
fn build_input(content: &str, geometry: Option<&str>) -> Result<ReceiptInput> {
    let mut input = if content.trim_start().starts_with('{') {
        ReceiptInput::from_json(content).context("Failed to decode input document")?
    } else {
        ReceiptInput::from_text(content)
    };
    if let Some(geo) = geometry {
        let geo = ReceiptInput::from_json(geo).context("Failed to decode geometry document")?;
        input.pages = geo.pages;
        if input.text.is_none() {
            input.text = geo.text;
        }
    }
    Ok(input)
}

//! crossdoc CLI - document tree post-processor for parsed academic papers

#[cfg(feature = "cli")]
use clap::{Parser, ValueEnum};
#[cfg(feature = "cli")]
use crossdoc::{process_json, ProcessOptions, RenderTarget};
#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::io::{self, Read, Write};

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "crossdoc")]
#[command(version)]
#[command(about = "Number and cross-reference a parsed document tree", long_about = None)]
struct Cli {
    /// Input JSON file path (reads from stdin if not provided)
    input_file: Option<String>,

    /// Output file path (writes to stdout if not provided)
    #[arg(short, long)]
    output: Option<String>,

    /// Render target; non-HTML targets skip figure lightbox decoration
    #[arg(short, long, value_enum, default_value_t = Target::Html)]
    target: Target,

    /// Caption word for figures
    #[arg(long, default_value = "Figure")]
    figure_title: String,

    /// Caption word for tables
    #[arg(long, default_value = "Table")]
    table_title: String,

    /// Caption word for sections
    #[arg(long, default_value = "Section")]
    section_title: String,

    /// Caption word for code listings
    #[arg(long, default_value = "Listing")]
    listing_title: String,

    /// Write a processing report JSON to this path
    #[arg(long)]
    report: Option<String>,

    /// Use colored warning output
    #[arg(long, default_value_t = true)]
    color: bool,
}

#[cfg(feature = "cli")]
#[derive(Clone, ValueEnum)]
enum Target {
    /// HTML output, with figure lightbox decoration
    Html,
    /// Any non-HTML output
    Plain,
}

#[cfg(feature = "cli")]
fn main() -> io::Result<()> {
    let cli = Cli::parse();

    let input = match cli.input_file {
        Some(ref path) => fs::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let options = ProcessOptions {
        target: match cli.target {
            Target::Html => RenderTarget::Html,
            Target::Plain => RenderTarget::Other,
        },
        figure_title: cli.figure_title,
        table_title: cli.table_title,
        section_title: cli.section_title,
        listing_title: cli.listing_title,
        ..ProcessOptions::default()
    };

    let (result, report) = process_json(&input, options)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;

    for warning in &report.warnings {
        if cli.color {
            eprintln!("\x1b[33mwarning\x1b[0m: {}", warning);
        } else {
            eprintln!("warning: {}", warning);
        }
    }

    if let Some(path) = cli.report.as_ref() {
        let serialized = serde_json::to_string_pretty(&report)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
        fs::write(path, serialized)?;
    }

    match cli.output {
        Some(path) => {
            let mut file = fs::File::create(&path)?;
            writeln!(file, "{}", result)?;
            eprintln!("✓ Output written to: {}", path);
        }
        None => {
            println!("{}", result);
        }
    }

    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Build with --features cli");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  cargo install crossdoc --features cli");
    eprintln!("  crossdoc [OPTIONS] [INPUT_FILE]");
}

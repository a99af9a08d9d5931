//! Command-line driver: run the inference engine over a JSON-encoded
//! instruction trace and print the inferred result type.

mod trace;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bytehint", version, about = "Static type inference for stack-machine bytecode")]
struct Cli {
    /// Path to a JSON instruction trace.
    trace: PathBuf,

    /// Increase log verbosity (-v: debug, -vv: trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print only the inferred type, with no decoration.
    #[arg(long)]
    plain: bool,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("bytehint={default_level},bytehint_core={default_level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let text = std::fs::read_to_string(&cli.trace)
        .with_context(|| format!("reading {}", cli.trace.display()))?;
    let parsed = trace::Trace::from_json(&text)?;
    let version = parsed.version()?;
    let result = trace::infer(&parsed)?;

    if cli.plain {
        println!("{result}");
    } else {
        let rendered = result.to_string();
        println!(
            "{} {} ({} instructions, isa {})",
            "inferred:".green().bold(),
            rendered.as_str().bold(),
            parsed.code.len(),
            version
        );
    }
    Ok(())
}

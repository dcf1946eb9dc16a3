//! dumplib - Inspect a pattern library file
//!
//! Prints the collection -> sub-collection -> pattern hierarchy of a
//! pattern library JSON file, or dumps one named pattern in full.

use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::Parser;

use salween_core::PatternLibrary;

/// Inspect the hierarchy of a pattern library JSON file.
#[derive(Parser, Debug)]
#[command(name = "dumplib")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the pattern library JSON file
    library: PathBuf,

    /// Dump one pattern in full, addressed as TYPE/FORMAT/NAME
    #[arg(short = 'p', long = "pattern")]
    pattern: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let file = File::open(&args.library)
        .with_context(|| format!("could not open pattern library {}", args.library.display()))?;
    let library: PatternLibrary =
        serde_json::from_reader(file).context("could not parse pattern library")?;

    match &args.pattern {
        Some(path) => {
            let mut parts = path.splitn(3, '/');
            let (Some(doc_type), Some(format), Some(name)) =
                (parts.next(), parts.next(), parts.next())
            else {
                bail!("pattern address must be TYPE/FORMAT/NAME, got {path}");
            };
            let Some(pattern) = library.pattern(doc_type, format, name) else {
                bail!("no pattern at {path}");
            };
            println!("{}", serde_json::to_string_pretty(pattern)?);
        }
        None => {
            for (doc_type, collection) in &library.collections {
                println!("{doc_type}");
                for (format, sub) in &collection.sub_collections {
                    println!("  {format} ({} patterns)", sub.len());
                    for name in sub.patterns.keys() {
                        println!("    {name}");
                    }
                }
            }
        }
    }
    Ok(())
}

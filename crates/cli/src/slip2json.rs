//! slip2json - Extract structured bank-slip fields from OCR output
//!
//! Reads an OCR response JSON file plus a pattern-library JSON file, runs
//! the glyph-cluster merge pass and pattern-based extraction, and prints
//! the structured result as JSON.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{ArgAction, Parser};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use salween_core::{
    BankSlipData, FormatContext, MemoryStore, MergeParams, OcrResponse, PatternLibrary,
    PatternLibraryManager, SpatialDocument, ValidationConfig, select_parser,
};

/// Extract structured bank-slip fields from an OCR response using a
/// pattern library.
#[derive(Parser, Debug)]
#[command(name = "slip2json")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the OCR response JSON file
    ocr: PathBuf,

    /// Path to the pattern library JSON file
    #[arg(short = 'l', long = "library")]
    library: PathBuf,

    /// Document type (collection name)
    #[arg(short = 't', long = "doc-type", default_value = "BankSlips")]
    doc_type: String,

    /// Format (sub-collection) name, e.g. the issuing bank's layout
    #[arg(short = 'f', long = "format")]
    format: String,

    /// Treat the format as dual-language (Thai + transliterated names)
    #[arg(long, action = ArgAction::SetTrue)]
    dual_language: bool,

    /// Skip the Thai glyph-cluster merge pass
    #[arg(long = "no-merge", action = ArgAction::SetTrue)]
    no_merge: bool,

    /// Output file (default: stdout)
    #[arg(short = 'o', long = "outfile")]
    outfile: Option<PathBuf>,

    /// Use debug logging level
    #[arg(short = 'd', long, action = ArgAction::SetTrue)]
    debug: bool,
}

#[derive(Serialize)]
struct Output<'a> {
    /// Whether the result passed minimum-acceptance validation; false
    /// routes the record to manual review.
    accepted: bool,
    result: &'a BankSlipData,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.debug);

    let ocr_file = File::open(&args.ocr)
        .with_context(|| format!("could not open OCR response {}", args.ocr.display()))?;
    let response: OcrResponse =
        serde_json::from_reader(ocr_file).context("could not parse OCR response")?;

    let mut doc = SpatialDocument::from_response(response);
    if !args.no_merge {
        let fused = doc.merge_thai_clusters(&MergeParams::default());
        debug!(fused, words = doc.len(), "glyph-cluster merge complete");
    }

    let library_file = File::open(&args.library)
        .with_context(|| format!("could not open pattern library {}", args.library.display()))?;
    let library: PatternLibrary =
        serde_json::from_reader(library_file).context("could not parse pattern library")?;
    let store = MemoryStore::with_library(&library)?;
    let manager = Arc::new(PatternLibraryManager::new(Box::new(store)));

    let parser = select_parser(Some(manager), ValidationConfig::default());
    let format = FormatContext::new(&args.doc_type, &args.format)
        .with_dual_language(args.dual_language);

    let result = parser.extract(&doc, &format)?;
    let output = Output {
        accepted: parser.validate(&result),
        result: &result,
    };

    match &args.outfile {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("could not create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, &output)?;
            writer.write_all(b"\n")?;
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, &output)?;
            writer.write_all(b"\n")?;
        }
    }
    Ok(())
}

fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

//! Chunk extracted text files from disk and print one JSON line per file.
//!
//! Form feeds split a file into pages, matching what PDF text extraction tools emit.
use std::{
    fs,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use rustychunk::{
    config::{self, ChunkingConfig},
    logging,
    processing::{
        ChunkedDocument, DocumentMetadata, build_payload_records, chunk_pages,
        payload::current_timestamp_rfc3339, split_pages,
    },
};
use serde_json::{Value, json};
use walkdir::WalkDir;

const DEFAULT_EXTENSIONS: &[&str] = &["md", "markdown", "txt"];

#[derive(Parser)]
#[command(
    name = "chunk-files",
    about = "Chunk text or markdown files into linked retrieval chunks"
)]
struct Cli {
    /// Files or directories to chunk.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    /// What to print for each file.
    #[arg(long, value_enum, default_value_t = OutputFormat::Summary)]
    format: OutputFormat,
    /// File extensions picked up when walking directories.
    #[arg(long = "extension", value_delimiter = ',')]
    extensions: Vec<String>,
    #[arg(long)]
    max_chunk_size: Option<usize>,
    #[arg(long)]
    min_chunk_size: Option<usize>,
    #[arg(long)]
    overlap_size: Option<usize>,
    /// Language tag copied onto every chunk.
    #[arg(long)]
    language: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Summary,
    Chunks,
    Payloads,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(logging::LogOutput::Stderr);

    let defaults = config::init_config()
        .context("failed to load configuration")?
        .chunking;
    let chunking =
        defaults.with_overrides(cli.max_chunk_size, cli.min_chunk_size, cli.overlap_size);
    chunking
        .validate()
        .context("invalid chunk size configuration")?;

    let extensions = if cli.extensions.is_empty() {
        DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect()
    } else {
        cli.extensions.clone()
    };
    let files = collect_input_files(&cli.inputs, &extensions)?;
    if files.is_empty() {
        bail!("no input files matched extensions {}", extensions.join(","));
    }

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for path in files {
        let line = chunk_file(&path, &chunking, cli.language.as_deref(), cli.format)?;
        writeln!(out, "{line}").context("failed to write output")?;
    }
    out.flush().context("failed to flush output")?;
    Ok(())
}

fn chunk_file(
    path: &Path,
    chunking: &ChunkingConfig,
    language: Option<&str>,
    format: OutputFormat,
) -> Result<Value> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let pages = split_pages(&text);
    let metadata = file_metadata(path, language);
    let document = chunk_pages(&pages, &metadata, chunking)
        .with_context(|| format!("failed to chunk {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        pages = pages.len(),
        chunks = document.len(),
        "Chunked file"
    );
    Ok(render(path, pages.len(), &document, format))
}

fn file_metadata(path: &Path, language: Option<&str>) -> DocumentMetadata {
    DocumentMetadata {
        document_id: Some(path.display().to_string().into()),
        filename: path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned().into()),
        mime_type: Some(mime_type_for(path).into()),
        language: language.map(Value::from),
        ..Default::default()
    }
}

fn mime_type_for(path: &Path) -> &'static str {
    match extension_of(path).as_deref() {
        Some("md") | Some("markdown") => "text/markdown",
        _ => "text/plain",
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

fn render(
    path: &Path,
    page_count: usize,
    document: &ChunkedDocument,
    format: OutputFormat,
) -> Value {
    let path = path.display().to_string();
    match format {
        OutputFormat::Summary => {
            let related: usize = document
                .chunks
                .iter()
                .map(|chunk| chunk.related_chunk_ids.len())
                .sum();
            let max_chars = document
                .chunks
                .iter()
                .map(|chunk| chunk.char_count)
                .max()
                .unwrap_or(0);
            json!({
                "path": path,
                "pages": page_count,
                "chunks": document.len(),
                "relationships": related,
                "max_chars": max_chars,
            })
        }
        OutputFormat::Chunks => json!({ "path": path, "chunks": document.chunks }),
        OutputFormat::Payloads => {
            let records = build_payload_records(&document.chunks, &current_timestamp_rfc3339());
            json!({ "path": path, "points": records })
        }
    }
}

/// Expand inputs into a sorted, deduplicated file list.
///
/// Explicit files are always kept; directories are walked for matching extensions.
fn collect_input_files(inputs: &[PathBuf], extensions: &[String]) -> Result<Vec<PathBuf>> {
    let wanted: Vec<String> = extensions
        .iter()
        .map(|ext| ext.trim_start_matches('.').to_lowercase())
        .collect();
    let mut files = Vec::new();

    for input in inputs {
        if input.is_file() {
            files.push(input.clone());
            continue;
        }
        if !input.is_dir() {
            bail!("input path {} does not exist", input.display());
        }
        for entry in WalkDir::new(input).follow_links(true) {
            let entry = entry.with_context(|| format!("failed to walk {}", input.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let matches = extension_of(entry.path())
                .map(|ext| wanted.contains(&ext))
                .unwrap_or(false);
            if matches {
                files.push(entry.into_path());
            }
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

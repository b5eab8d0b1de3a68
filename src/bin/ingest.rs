use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

use study_rag::config::Config;
use study_rag::indexer::chunker::Chunker;
use study_rag::indexer::walker::find_pdf_files;
use study_rag::rag::embedder::Embedder;
use study_rag::rag::generator::Generator;
use study_rag::rag::vector_store::VectorStore;
use study_rag::rag::RagEngine;

#[derive(Parser, Debug)]
#[command(name = "ingest")]
#[command(about = "Bulk-index a directory of PDF study materials into the vector store")]
struct Args {
    /// Directory to recursively scan for PDFs
    #[arg(short, long, default_value = "./papers")]
    dir: PathBuf,

    /// Vector store URL
    #[arg(long, env = "VECTOR_STORE_URL", default_value = "http://localhost:6334")]
    vector_store_url: String,

    /// Collection name
    #[arg(long, env = "VECTOR_STORE_COLLECTION", default_value = "study-notes")]
    collection: String,

    /// Maximum chunk size in characters
    #[arg(long, default_value_t = 800)]
    chunk_size: usize,

    /// Overlap between chunks in characters
    #[arg(long, default_value_t = 150)]
    chunk_overlap: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = Config::from_env()?;

    if !args.dir.exists() {
        anyhow::bail!("Directory does not exist: {}", args.dir.display());
    }

    println!("Scanning directory: {}", args.dir.display());
    let files = find_pdf_files(&args.dir);
    println!("Found {} PDF file(s)", files.len());

    if files.is_empty() {
        println!("Nothing to ingest. Exiting.");
        return Ok(());
    }

    println!("Initializing embedding model...");
    let embedder = Embedder::new()?;

    println!("Connecting to vector store at {}...", args.vector_store_url);
    let store = VectorStore::connect(
        &args.vector_store_url,
        config.vector_store_api_key.clone(),
        &args.collection,
    )
    .await?;

    let chunker = Chunker::new(args.chunk_size, args.chunk_overlap)?;
    let engine = RagEngine::new(chunker, embedder, store, Generator::new(config.llm.clone()));

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let mut success_count = 0usize;
    let mut total_chunks = 0usize;
    let mut failed_files: Vec<(PathBuf, String)> = Vec::new();

    for path in &files {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        pb.set_message(filename.clone());

        let outcome = match std::fs::read(path) {
            Ok(bytes) => engine.ingest_document(&filename, &bytes).await,
            Err(e) => Err(e.into()),
        };

        match outcome {
            Ok(chunk_count) => {
                success_count += 1;
                total_chunks += chunk_count;
            }
            Err(e) => {
                tracing::warn!("Failed to ingest {}: {}", path.display(), e);
                failed_files.push((path.clone(), e.to_string()));
            }
        }

        pb.inc(1);
    }

    pb.finish_with_message("done");

    println!("\nIngestion complete!");
    println!("  Successfully added {} chunks from {} file(s)", total_chunks, success_count);
    println!("  Files failed:    {}", failed_files.len());
    println!("  Collection:      {}", args.collection);

    if !failed_files.is_empty() {
        println!("\nFailed files:");
        for (path, err) in &failed_files {
            println!("  {}: {}", path.display(), err);
        }
    }

    Ok(())
}

//! Command-line front end for the `docqa-rag` engine.
//!
//! Wires the Ollama embedding/generation collaborators, a Qdrant vector
//! index, and a text-embeddings-inference cross-encoder into the engine and
//! exposes the ingest/search/ask workflow as subcommands. Plumbing only —
//! all retrieval behavior lives in `docqa-rag`.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use docqa_rag::ollama::{OllamaEmbeddingProvider, OllamaGenerator};
use docqa_rag::qdrant::QdrantIndex;
use docqa_rag::tei::TeiScorer;
use docqa_rag::{Document, RagConfig, RagEngine};

#[derive(Parser)]
#[command(name = "docqa", version, about = "Question answering over a private document corpus")]
struct Cli {
    /// Ollama server URL (embeddings and generation).
    #[arg(long, env = "DOCQA_OLLAMA_URL", default_value = "http://localhost:11434")]
    ollama_url: String,

    /// Qdrant server URL (vector index).
    #[arg(long, env = "DOCQA_QDRANT_URL", default_value = "http://localhost:6334")]
    qdrant_url: String,

    /// text-embeddings-inference server URL (cross-encoder reranking).
    #[arg(long, env = "DOCQA_TEI_URL", default_value = "http://localhost:8080")]
    tei_url: String,

    /// Embedding model name.
    #[arg(long, env = "DOCQA_EMBEDDING_MODEL", default_value = "all-minilm")]
    embedding_model: String,

    /// Embedding dimensionality of the configured model.
    #[arg(long, env = "DOCQA_EMBEDDING_DIMENSIONS", default_value_t = 384)]
    embedding_dimensions: usize,

    /// Generation model name.
    #[arg(long, env = "DOCQA_GENERATION_MODEL", default_value = "mistral")]
    generation_model: String,

    /// Vector index collection name.
    #[arg(long, env = "DOCQA_COLLECTION", default_value = "documents")]
    collection: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load .txt/.md files from a directory into the index.
    Ingest {
        /// Directory containing the documents.
        dir: PathBuf,
        /// Clear the index before ingesting.
        #[arg(long)]
        replace: bool,
    },
    /// Retrieve the most relevant chunks for a query.
    Search {
        query: String,
        /// Number of results.
        #[arg(short, long, default_value_t = 5)]
        k: usize,
    },
    /// Answer a question from the ingested documents.
    Ask {
        question: String,
        /// Use two-stage retrieval with cross-encoder reranking.
        #[arg(long)]
        rerank: bool,
    },
    /// Show index statistics.
    Stats,
    /// Remove every entry from the index.
    Clear,
}

/// Load plain-text documents from a directory, one `Document` per file.
///
/// PDF extraction is an external concern; only `.txt` and `.md` files are
/// picked up here.
fn load_documents(dir: &Path) -> anyhow::Result<Vec<Document>> {
    let mut documents = Vec::new();

    let entries =
        fs::read_dir(dir).with_context(|| format!("failed to read directory {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        let is_text = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| matches!(e, "txt" | "md"));
        if !is_text {
            continue;
        }

        let doc_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();
        match fs::read_to_string(&path) {
            Ok(content) => documents.push(Document::new(content, doc_name, 0)),
            Err(e) => warn!(file = %path.display(), error = %e, "skipping unreadable file"),
        }
    }

    documents.sort_by(|a, b| a.doc_name.cmp(&b.doc_name));
    Ok(documents)
}

fn build_engine(cli: &Cli) -> anyhow::Result<RagEngine> {
    let config = RagConfig::builder()
        .embedding_model(cli.embedding_model.clone())
        .collection(cli.collection.clone())
        .build()?;

    let embedder = OllamaEmbeddingProvider::new()
        .with_url(cli.ollama_url.clone())
        .with_model(cli.embedding_model.clone(), cli.embedding_dimensions);
    let index =
        QdrantIndex::new(&cli.qdrant_url, cli.collection.clone(), cli.embedding_dimensions)?;
    let scorer = TeiScorer::new(cli.tei_url.clone());
    let generator = OllamaGenerator::new()
        .with_url(cli.ollama_url.clone())
        .with_model(cli.generation_model.clone());

    let engine = RagEngine::builder()
        .config(config)
        .embedding_provider(Arc::new(embedder))
        .vector_index(Arc::new(index))
        .pairwise_scorer(Arc::new(scorer))
        .generator(Arc::new(generator))
        .build()?;

    Ok(engine)
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let engine = build_engine(&cli)?;

    match &cli.command {
        Command::Ingest { dir, replace } => {
            let documents = load_documents(dir)?;
            if documents.is_empty() {
                warn!(dir = %dir.display(), "no .txt or .md files found");
            }
            let report = engine.ingest(&documents, *replace).await?;
            info!(
                documents = report.documents,
                chunks = report.chunks,
                indexed = report.indexed,
                "ingestion complete"
            );
            print_json(&report)?;
        }
        Command::Search { query, k } => {
            let results = engine.retrieve(query, *k).await?;
            if results.is_empty() {
                warn!("no documents ingested yet");
            }
            print_json(&results)?;
        }
        Command::Ask { question, rerank } => {
            let answer = if *rerank {
                engine.ask_reranked(question).await?
            } else {
                engine.ask(question).await?
            };
            print_json(&answer)?;
        }
        Command::Stats => {
            let stats = engine.stats().await?;
            print_json(&stats)?;
        }
        Command::Clear => {
            engine.clear().await?;
            let stats = engine.stats().await?;
            print_json(&stats)?;
        }
    }

    Ok(())
}

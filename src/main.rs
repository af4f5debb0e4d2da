//! # doc-summarizer CLI (`docsum`)
//!
//! ## Usage
//!
//! ```bash
//! docsum [--config ./docsum.toml] <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docsum files` | List the documents in the configured folder |
//! | `docsum ask "<question>" --file <name>...` | Answer a question from the selected files |
//! | `docsum serve` | Start the HTTP server |
//!
//! Logs go to stderr; set `RUST_LOG=debug` for stage-by-stage detail.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use doc_summarizer::config::{load_config, Config};
use doc_summarizer::corpus::CorpusIndex;
use doc_summarizer::server::run_server;
use doc_summarizer::service::DocService;

/// doc-summarizer: ask questions about a folder of text and PDF documents.
#[derive(Parser)]
#[command(name = "docsum", version)]
struct Cli {
    /// Path to configuration file (TOML). Built-in defaults when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the documents available for selection.
    Files {
        /// Also show how many chunks each file produced.
        #[arg(long)]
        chunks: bool,
    },

    /// Answer a question using the selected documents.
    Ask {
        question: String,

        /// File to answer from; repeat for several. None means no context.
        #[arg(long = "file", value_name = "NAME")]
        files: Vec<String>,
    },

    /// Start the HTTP server on `[server].bind`.
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Files { chunks } => {
            let index = CorpusIndex::ingest(
                &config.docs.folder,
                config.chunking.chunk_size,
                config.chunking.chunk_overlap,
            )?;
            for name in index.list_file_names() {
                if chunks {
                    println!("{}\t{}", name, index.chunks_for(&name).len());
                } else {
                    println!("{}", name);
                }
            }
            for (name, err) in index.failures() {
                eprintln!("skipped {}: {}", name, err);
            }
        }
        Commands::Ask { question, files } => {
            let service = DocService::from_config(config)?;
            let response = service.answer(&question, &files).await?;
            tracing::info!(standalone = %response.standalone_question, "standalone question");
            for s in &response.sources {
                tracing::info!(
                    file = %s.source_file,
                    index = s.sequence_index,
                    score = s.score,
                    "source"
                );
            }
            println!("{}", response.answer);
        }
        Commands::Serve => {
            let service = Arc::new(DocService::from_config(config)?);
            run_server(service).await?;
        }
    }

    Ok(())
}

//! CLI command definitions and argument parsing

use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;

#[derive(Parser)]
#[command(name = "docchat")]
#[command(about = "Streaming documentation chat backend with multi-query RAG")]
#[command(version)]
pub struct Cli {
    /// Enable verbose debug logging (default: info level)
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file (default: config.toml, then config.example.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Host to bind (overrides server.host)
        #[arg(long)]
        host: Option<String>,
        /// Port to bind (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,
        /// Disable CORS headers
        #[arg(long)]
        no_cors: bool,
    },
    /// Load, split, embed and index documentation files
    Ingest {
        /// Files or directories (.md, .mdx, .txt, .jsonl)
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Clear the index before ingesting
        #[arg(long)]
        reset: bool,
    },
    /// Print the search queries generated for a question
    Queries {
        /// The user question
        question: String,
    },
    /// Stream an answer to stdout (Ctrl-C stops generation)
    Ask {
        /// The user question
        question: String,
    },
    /// Show current configuration
    Config,
}

//! CLI argument parsing for the outline daemon.
//!
//! CLI flags override all other config sources.

use clap::{Parser, Subcommand};

use outline_types::EmbeddingBackend;

/// Course Outline Daemon
///
/// Generates course outlines from a main topic and subtopics.
#[derive(Parser, Debug)]
#[command(name = "outline-daemon")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/course-outline/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Daemon commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server
    Start {
        /// Run in foreground (don't daemonize)
        #[arg(short, long)]
        foreground: bool,

        /// Override HTTP port
        #[arg(short, long)]
        port: Option<u16>,

        /// Override HTTP host
        #[arg(long)]
        host: Option<String>,

        /// Override embedding backend (transformer, tfidf)
        #[arg(long)]
        embedding_backend: Option<EmbeddingBackend>,
    },

    /// Stop the running daemon
    Stop,

    /// Show daemon status
    Status,

    /// Generate one outline in-process and print it as JSON
    Generate {
        /// Course title
        #[arg(short, long, required_unless_present = "prompt", conflicts_with = "prompt")]
        main_topic: Option<String>,

        /// Subtopic to include (repeatable)
        #[arg(short, long = "subtopic")]
        subtopics: Vec<String>,

        /// Number of topics
        #[arg(short, long)]
        num_topics: Option<usize>,

        /// Raw prompt (JSON request or free text) instead of flags
        #[arg(long)]
        prompt: Option<String>,

        /// Override embedding backend (transformer, tfidf)
        #[arg(long)]
        embedding_backend: Option<EmbeddingBackend>,

        /// Indent the JSON output
        #[arg(long)]
        pretty: bool,

        /// Include the processing report alongside the outline
        #[arg(long)]
        report: bool,
    },
}

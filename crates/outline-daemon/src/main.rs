//! Course Outline Daemon
//!
//! Serves `POST /api/prompt`, turning a main topic and subtopics into a
//! course outline.
//!
//! # Usage
//!
//! ```bash
//! outline-daemon start [--foreground] [--port PORT] [--host HOST] [--embedding-backend tfidf]
//! outline-daemon stop
//! outline-daemon status
//! outline-daemon generate --main-topic "Rust" --subtopic Ownership --num-topics 4
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/course-outline/config.toml)
//! 3. Environment variables (OUTLINE_*)
//! 4. CLI flags

use anyhow::Result;
use clap::Parser;

use outline_daemon::{
    generate_outline, show_status, start_daemon, stop_daemon, Cli, Commands, GenerateArgs,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Start {
            foreground,
            port,
            host,
            embedding_backend,
        } => {
            start_daemon(
                cli.config.as_deref(),
                foreground,
                port,
                host.as_deref(),
                embedding_backend,
                cli.log_level.as_deref(),
            )
            .await?;
        }
        Commands::Stop => {
            stop_daemon()?;
        }
        Commands::Status => {
            show_status()?;
        }
        Commands::Generate {
            main_topic,
            subtopics,
            num_topics,
            prompt,
            embedding_backend,
            pretty,
            report,
        } => {
            let args = GenerateArgs {
                main_topic,
                subtopics,
                num_topics,
                prompt,
                backend: embedding_backend,
                pretty,
                report,
            };
            // Model loading blocks; keep it off the async workers.
            let config = cli.config.clone();
            let log_level = cli.log_level.clone();
            tokio::task::spawn_blocking(move || {
                generate_outline(config.as_deref(), log_level.as_deref(), args)
            })
            .await??;
        }
    }

    Ok(())
}

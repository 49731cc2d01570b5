//! Command implementations for the outline daemon.
//!
//! Handles:
//! - start: Load config, build the processor, start the HTTP server
//! - stop: Signal running daemon to stop (via PID file)
//! - status: Check if daemon is running
//! - generate: Build one outline in-process and print it

use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::signal;
use tracing::{info, warn};

use outline_service::{run_server_with_shutdown, OutlineProcessor, ProcessingReport};
use outline_types::{
    CourseOutline, EmbeddingBackend, OutlineRequest, Settings, DEFAULT_NUM_TOPICS,
};

/// Get the PID file path
fn pid_file_path() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| {
            #[cfg(unix)]
            {
                dirs.runtime_dir()
                    .map(|p| p.to_path_buf())
                    .unwrap_or_else(|| dirs.cache_dir().to_path_buf())
            }
            #[cfg(not(unix))]
            {
                dirs.cache_dir().to_path_buf()
            }
        })
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("course-outline")
        .join("daemon.pid")
}

fn write_pid_file() -> Result<()> {
    let pid_path = pid_file_path();
    if let Some(parent) = pid_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&pid_path, std::process::id().to_string())?;
    info!("Wrote PID file: {:?}", pid_path);
    Ok(())
}

fn remove_pid_file() {
    let pid_path = pid_file_path();
    if pid_path.exists() {
        if let Err(e) = fs::remove_file(&pid_path) {
            warn!("Failed to remove PID file: {}", e);
        } else {
            info!("Removed PID file");
        }
    }
}

fn read_pid_file() -> Option<u32> {
    fs::read_to_string(pid_file_path())
        .ok()
        .and_then(|s| s.trim().parse().ok())
}

/// Signal 0 checks that the process exists.
#[cfg(unix)]
fn is_process_running(pid: u32) -> bool {
    unsafe { libc::kill(pid as i32, 0) == 0 }
}

#[cfg(not(unix))]
fn is_process_running(_pid: u32) -> bool {
    true
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level. Logs go to stderr so
/// `generate` can keep stdout for JSON.
fn init_logging(level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Load settings and apply the overrides shared by every command.
fn load_settings(
    config_path: Option<&str>,
    log_level_override: Option<&str>,
    backend_override: Option<EmbeddingBackend>,
) -> Result<Settings> {
    let mut settings = Settings::load(config_path).context("Failed to load configuration")?;
    if let Some(log_level) = log_level_override {
        settings.log_level = log_level.to_string();
    }
    if let Some(backend) = backend_override {
        settings.embeddings.backend = backend;
    }
    Ok(settings)
}

/// Start the outline daemon.
///
/// 1. Load configuration (defaults -> file -> env -> CLI)
/// 2. Load the embedding model, falling back to TF-IDF
/// 3. Start the HTTP server
/// 4. Handle graceful shutdown on SIGINT/SIGTERM
pub async fn start_daemon(
    config_path: Option<&str>,
    foreground: bool,
    port_override: Option<u16>,
    host_override: Option<&str>,
    backend_override: Option<EmbeddingBackend>,
    log_level_override: Option<&str>,
) -> Result<()> {
    let mut settings = load_settings(config_path, log_level_override, backend_override)?;
    if let Some(port) = port_override {
        settings.http_port = port;
    }
    if let Some(host) = host_override {
        settings.http_host = host.to_string();
    }

    init_logging(&settings.log_level)?;

    info!("Outline daemon starting...");
    info!("Configuration:");
    info!("  HTTP address: {}", settings.http_addr());
    info!("  Embedding backend: {}", settings.embeddings.backend.as_str());
    info!("  Model: {}", settings.embeddings.model_repo);
    info!(
        "  Clustering: {} (enabled: {}, k: {})",
        settings.clustering.algorithm.as_str(),
        settings.clustering.enabled,
        settings.clustering.k
    );
    info!("  Log level: {}", settings.log_level);

    if !foreground {
        warn!("Background mode not implemented, running in foreground");
        warn!("Use a process manager (systemd, launchd) for background operation");
    }

    let addr: SocketAddr = settings
        .http_addr()
        .parse()
        .context("Invalid HTTP address")?;

    // Model loading reads weights from disk and may download them.
    let setup = settings.clone();
    let processor =
        tokio::task::spawn_blocking(move || OutlineProcessor::from_settings(&setup))
            .await
            .context("Processor setup task failed")?
            .context("Failed to build outline processor")?;

    write_pid_file()?;

    let shutdown_signal = async {
        let ctrl_c = async {
            if let Err(e) = signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    warn!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("Received Ctrl+C, shutting down...");
            }
            _ = terminate => {
                info!("Received SIGTERM, shutting down...");
            }
        }
    };

    let result = run_server_with_shutdown(addr, Arc::new(processor), shutdown_signal).await;

    remove_pid_file();

    result.map_err(|e| anyhow::anyhow!("Server error: {}", e))
}

/// Stop the running daemon by sending SIGTERM.
pub fn stop_daemon() -> Result<()> {
    let pid = read_pid_file().context("No PID file found - daemon may not be running")?;

    if !is_process_running(pid) {
        remove_pid_file();
        anyhow::bail!("Daemon not running (stale PID file removed)");
    }

    #[cfg(unix)]
    {
        unsafe {
            if libc::kill(pid as i32, libc::SIGTERM) != 0 {
                anyhow::bail!("Failed to send SIGTERM to daemon");
            }
        }
        println!("Sent SIGTERM to daemon (PID {})", pid);
    }

    #[cfg(not(unix))]
    {
        anyhow::bail!("Stop command not implemented on this platform");
    }

    Ok(())
}

/// Show daemon status.
pub fn show_status() -> Result<()> {
    let pid_path = pid_file_path();

    match read_pid_file() {
        Some(pid) if is_process_running(pid) => {
            println!("Outline daemon is running (PID {})", pid);
            println!("PID file: {:?}", pid_path);
        }
        Some(pid) => {
            println!(
                "Outline daemon is NOT running (stale PID {} in {:?})",
                pid, pid_path
            );
        }
        None => {
            println!("Outline daemon is NOT running (no PID file)");
        }
    }
    Ok(())
}

/// Input for the `generate` command.
#[derive(Debug, Default)]
pub struct GenerateArgs {
    pub main_topic: Option<String>,
    pub subtopics: Vec<String>,
    pub num_topics: Option<usize>,
    pub prompt: Option<String>,
    pub backend: Option<EmbeddingBackend>,
    pub pretty: bool,
    pub report: bool,
}

impl GenerateArgs {
    /// A raw prompt takes precedence over the individual flags.
    pub fn to_request(&self) -> Result<OutlineRequest> {
        if let Some(prompt) = &self.prompt {
            return OutlineRequest::from_prompt(prompt).context("Failed to parse prompt");
        }
        let main_topic = self
            .main_topic
            .clone()
            .context("Either --main-topic or --prompt is required")?;
        Ok(OutlineRequest::new(
            main_topic,
            self.subtopics.clone(),
            self.num_topics.unwrap_or(DEFAULT_NUM_TOPICS),
        ))
    }
}

#[derive(Serialize)]
struct GenerateOutput<'a> {
    outline: &'a CourseOutline,
    report: &'a ProcessingReport,
}

/// Build one outline and render it as the JSON text `generate` prints.
pub fn render_outline(settings: &Settings, args: &GenerateArgs) -> Result<String> {
    let request = args.to_request()?;
    let processor =
        OutlineProcessor::from_settings(settings).context("Failed to build outline processor")?;
    let processed = processor
        .process(request)
        .context("Failed to generate outline")?;

    let text = if args.report {
        let output = GenerateOutput {
            outline: &processed.outline,
            report: &processed.report,
        };
        if args.pretty {
            serde_json::to_string_pretty(&output)?
        } else {
            serde_json::to_string(&output)?
        }
    } else if args.pretty {
        processed.outline.to_json_pretty()?
    } else {
        processed.outline.to_json_string()?
    };
    Ok(text)
}

/// Generate one outline without a server and print it to stdout.
pub fn generate_outline(
    config_path: Option<&str>,
    log_level_override: Option<&str>,
    args: GenerateArgs,
) -> Result<()> {
    let mut settings = load_settings(config_path, log_level_override, args.backend)?;
    // Keep the terminal quiet unless asked.
    if log_level_override.is_none() {
        settings.log_level = "warn".to_string();
    }
    init_logging(&settings.log_level)?;

    println!("{}", render_outline(&settings, &args)?);
    Ok(())
}

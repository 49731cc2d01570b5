//! Outline daemon library exports.
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations (start, stop, status, generate)

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands};
pub use commands::{
    generate_outline, render_outline, show_status, start_daemon, stop_daemon, GenerateArgs,
};

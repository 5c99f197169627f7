//! CLI command definitions and dispatch for the `tsync` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod config;
pub mod tracker;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

use tracksync_infra::config::CONFIG_FILE_NAME;

/// Anonymizing tracker store synced with a remote GraphQL service.
#[derive(Parser)]
#[command(name = "tsync", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to the configuration file.
    #[arg(long, global = true, env = "TRACKSYNC_CONFIG", default_value = CONFIG_FILE_NAME)]
    pub config: PathBuf,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP sidecar and the background sweeper.
    Serve {
        /// Port to listen on.
        #[arg(long, default_value = "5055")]
        port: u16,

        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Fetch a conversation from the remote store.
    Retrieve {
        /// Conversation id.
        sender_id: String,

        /// Print the merged serialized record instead of a rebuilt tracker.
        #[arg(long)]
        raw: bool,
    },

    /// Persist a serialized conversation read from a JSON file.
    Save {
        /// Path to the conversation JSON.
        file: PathBuf,
    },

    /// Anonymize a piece of text and print the result.
    Anonymize {
        /// Text to anonymize.
        text: String,
    },

    /// Show the effective configuration.
    Config,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

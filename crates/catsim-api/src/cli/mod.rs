//! CLI command definitions for the `catsim` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod conversation;

use clap::{Parser, Subcommand};

use catsim_types::llm::MessageRole;

/// Chat with a cat, and keep the transcript.
#[derive(Parser)]
#[command(name = "catsim", version, about, long_about = None)]
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

    /// Emit logs as JSON lines.
    #[arg(long, global = true, env = "CATSIM_LOG_JSON")]
    pub log_json: bool,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true, env = "CATSIM_OTEL")]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server and the expiry sweeper.
    Serve {
        /// Port to listen on.
        #[arg(long, default_value = "3000")]
        port: u16,

        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Print a conversation, oldest turn first.
    Export {
        /// Conversation identifier.
        chat_id: String,
    },

    /// Append one turn to a conversation.
    Append {
        /// Conversation identifier.
        chat_id: String,

        /// Turn role: user, assistant or system.
        #[arg(long, default_value = "user")]
        role: MessageRole,

        /// Turn text.
        #[arg(long)]
        text: String,

        /// Timestamp hint: epoch milliseconds or an RFC 3339 date.
        #[arg(long)]
        timestamp: Option<String>,

        /// Expiry hint: epoch seconds or an RFC 3339 date.
        #[arg(long)]
        ttl: Option<String>,
    },

    /// Delete expired turns now.
    Purge,
}

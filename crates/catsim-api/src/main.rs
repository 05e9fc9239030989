//! Cat simulator CLI and REST API entry point.
//!
//! Binary name: `catsim`
//!
//! Parses CLI arguments, initializes the database and services, then
//! dispatches to the appropriate command handler or starts the REST API server.

mod cli;
mod http;
mod state;

use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;

use catsim_infra::sweeper::ExpirySweeper;
use catsim_observe::tracing_setup::{TracingOptions, init_tracing, shutdown_tracing};
use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,catsim=debug",
        _ => "trace",
    };
    let options = TracingOptions::new(filter)
        .json(cli.log_json)
        .otel(cli.otel);
    init_tracing(&options).map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let state = AppState::init().await?;

    match cli.command {
        Commands::Export { chat_id } => {
            cli::conversation::export(&state, &chat_id, cli.json).await?;
        }

        Commands::Append {
            chat_id,
            role,
            text,
            timestamp,
            ttl,
        } => {
            cli::conversation::append(
                &state,
                &chat_id,
                role,
                &text,
                timestamp.as_deref(),
                ttl.as_deref(),
                cli.json,
            )
            .await?;
        }

        Commands::Purge => {
            cli::conversation::purge(&state, cli.json).await?;
        }

        Commands::Serve { port, host } => {
            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            let cancel = CancellationToken::new();
            let sweeper = ExpirySweeper::new(
                state.chat_service.clone(),
                Duration::from_secs(state.config.sweep_interval_secs),
                cancel.clone(),
            )
            .spawn();

            if !cli.quiet {
                println!(
                    "  {} catsim API listening on {}",
                    console::style("🐈").bold(),
                    console::style(format!("http://{addr}")).cyan()
                );
                println!("  {}", console::style("Press Ctrl+C to stop").dim());
            }

            let router = http::router::build_router(state.clone());

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            cancel.cancel();
            if let Err(e) = sweeper.await {
                tracing::warn!(error = %e, "Expiry sweeper task ended abnormally");
            }
            state.db_pool.close().await;

            if !cli.quiet {
                println!("\n  Server stopped.");
            }
        }
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

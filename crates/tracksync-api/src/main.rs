//! tracksync CLI and HTTP sidecar entry point.
//!
//! Binary name: `tsync`
//!
//! Parses CLI arguments, loads configuration, wires the sync engine, then
//! dispatches to the appropriate command handler or starts the HTTP server
//! together with the background sweeper.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;

use tracksync_infra::config::load_config_from_env;
use tracksync_observe::tracing_setup::{init_tracing, shutdown_tracing};

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,tracksync_core=debug,tracksync_infra=debug,tracksync_api=debug",
        _ => "trace",
    };
    if let Err(e) = init_tracing(cli.otel, filter) {
        eprintln!("Warning: failed to initialize tracing: {e}");
    }

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Commands that need neither configuration nor the remote store
    match &cli.command {
        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            generate(*shell, &mut cmd, "tsync", &mut std::io::stdout());
            return Ok(());
        }
        Commands::Anonymize { text } => return cli::tracker::anonymize(text, cli.json),
        _ => {}
    }

    let config = load_config_from_env(&cli.config).await;

    if let Commands::Config = cli.command {
        return cli::config::show_config(&config, &cli.config, cli.json);
    }

    let state = AppState::init(config).await?;

    match cli.command {
        Commands::Retrieve { sender_id, raw } => {
            cli::tracker::retrieve(&state, &sender_id, raw, cli.json).await?;
        }

        Commands::Save { file } => {
            cli::tracker::save(&state, &file, cli.json).await?;
        }

        Commands::Serve { port, host } => {
            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            let sweeper = state.engine.spawn_sweeper();
            let event_log = state.spawn_event_log();

            if !cli.quiet {
                println!(
                    "  {} tracksync listening on {}",
                    console::style("⚡").bold(),
                    console::style(format!("http://{addr}")).cyan()
                );
                println!(
                    "  Remote store: {}",
                    console::style(&state.config.remote.url).dim()
                );
                println!("  {}", console::style("Press Ctrl+C to stop").dim());
            }

            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            sweeper.stop().await;
            event_log.abort();
            if !cli.quiet {
                println!("\n  Server stopped.");
            }
        }

        Commands::Completions { .. } | Commands::Anonymize { .. } | Commands::Config => {
            unreachable!("handled above")
        }
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

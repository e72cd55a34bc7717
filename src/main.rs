use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use ticket_triage::config::AppConfig;
use ticket_triage::db::Database;
use ticket_triage::logging::init_logging;
use ticket_triage::rest::RestStoreProvider;
use ticket_triage::service::TicketService;
use ticket_triage::store::{SharedStore, StoreProvider};
use ticket_triage::create_router;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service
    Serve {
        /// Address to bind (overrides configuration)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (overrides configuration)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print the scores a message would receive
    Score {
        /// Message text
        message: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Pick up a local .env before reading configuration
    dotenvy::dotenv().ok();

    // Load configuration
    let mut config = AppConfig::load()?;

    // Parse command line arguments
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            serve(&config).await?;
        },
        Commands::Score { message } => score(&config, &message)?,
    }

    Ok(())
}

/// Run the HTTP service until interrupted
async fn serve(config: &AppConfig) -> Result<()> {
    // Initialize logging
    let _guard = init_logging(
        Some(&config.get_log_level()),
        config.logging.file_path.as_deref().map(Path::new),
        config.logging.format == "json",
    )?;

    info!("Starting ticket-triage service");

    let provider: Arc<dyn StoreProvider> = match config.store.backend.as_str() {
        "sqlite" => {
            let database = Database::from_config(&config.store).context("Failed to open SQLite store")?;
            Arc::new(SharedStore::new(Arc::new(database)))
        },
        _ => Arc::new(RestStoreProvider::from_config(&config.store).context("Failed to set up table store client")?),
    };
    info!(backend = %config.store.backend, "Ticket store configured");

    let service = TicketService::new(provider, config.scoring_rules(), config.tickets.list_limit);
    let app = create_router(service);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shut down");
    Ok(())
}

/// Score a message locally and print the labels as JSON
fn score(config: &AppConfig, message: &str) -> Result<()> {
    let scores = config.scoring_rules().score(message);
    println!("{}", serde_json::to_string_pretty(&scores)?);
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // no signal handler available; run until killed
        std::future::pending::<()>().await;
    }
}

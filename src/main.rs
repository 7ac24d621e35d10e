//! Content server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http server ──▶ site grammar ──▶ Route
//!                     (axum, layers)   (routing)         │
//!                                                        ▼
//!                                                 handler: Handler<I>
//!                                                        │
//!                      ┌─────────────────────────────────┼──────────────────┐
//!                      ▼                                 ▼                  ▼
//!                 session store                    db (Sql/Query)    external calls
//!                 (cookie, CSRF)                   request-scoped     (Promise +
//!                                                  connection          deadline)
//!                                                        │
//!     Client Response                                    ▼
//!     ◀────────────── AxumInterpreter ◀──────── exactly one terminal op
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use content_server::config::{load_config, validate_config, ConfigError, ServerConfig};
use content_server::db::MemoryDatabase;
use content_server::external::HttpIdentityProvider;
use content_server::observability::{logging, metrics};
use content_server::site::schema;
use content_server::{AppContext, HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "content-server")]
#[command(about = "Content and subscription web server", long_about = None)]
struct Args {
    /// Path to the TOML configuration file (defaults when omitted).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Load the sample catalogue into the database on startup.
    #[arg(long)]
    seed: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => {
            let config = ServerConfig::default();
            validate_config(&config).map_err(ConfigError::Validation)?;
            config
        }
    };

    logging::init(&config.observability.log_level);
    tracing::info!("content-server v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        external_timeout_secs = config.timeouts.external_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let database = MemoryDatabase::new();
    schema::install(&database);
    if args.seed {
        schema::seed(&database).await?;
    }
    schema::verify_all(&database).await?;

    let identity = HttpIdentityProvider::new(&config.identity, Duration::from_secs(config.timeouts.external_secs))?;
    let app = Arc::new(AppContext::new(database, Arc::new(identity), &config));

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let shutdown = Shutdown::new();
    HttpServer::new(app, &config).run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

//! Astrolabe MCP Server - Entry Point
//!
//! Serves line-delimited JSON-RPC on stdin/stdout for astrological calculations.

use anyhow::Result;
use tokio::io::{stdin, stdout, BufReader};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use astrolabe::{AstrolabeServer, ServerConfig, SwissEngine};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging to stderr (stdout is used for MCP communication)
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    tracing::info!("Starting Astrolabe MCP Server");

    let config = ServerConfig::from_env();
    tracing::info!(
        gazetteer = %config.gazetteer_path.display(),
        ephemeris = ?config.ephe_path,
        "configuration loaded"
    );

    let engine = SwissEngine::new(config.ephe_path.as_deref());
    let server = AstrolabeServer::from_config(engine, &config);

    server.serve(BufReader::new(stdin()), stdout()).await?;

    tracing::info!("Server shutting down");

    Ok(())
}

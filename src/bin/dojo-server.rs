// ABOUTME: Server binary wiring configuration, database and routes together
// ABOUTME: Loads environment configuration, runs migrations and serves the API
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # Dojo Server Binary
//!
//! Starts the academy REST API with JWT authentication and SQLite storage.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use dojo_server::auth::AuthManager;
use dojo_server::config::environment::ServerConfig;
use dojo_server::database::Database;
use dojo_server::resources::ServerResources;
use dojo_server::{logging, routes};

#[derive(Parser)]
#[command(name = "dojo-server")]
#[command(about = "Dojo Server - martial-arts academy REST backend")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }

    logging::init_from_env()?;

    info!("Starting Dojo Server");
    info!("{}", config.summary());

    let database = Database::new(&config.database.url).await?;
    info!("Database initialized: {}", config.database.url);

    let auth_manager = AuthManager::new(
        config.auth.jwt_secret.as_bytes(),
        config.auth.token_expiry_hours,
    );
    info!("Authentication manager initialized");

    let resources = Arc::new(ServerResources::new(
        database,
        auth_manager,
        Arc::new(config.clone()),
    ));

    let app = routes::router(resources)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {addr}");

    axum::serve(listener, app).await?;

    Ok(())
}

// Library exports for indicator-api

pub mod config;
pub mod data;
pub mod diagnostics;
pub mod error;
pub mod indicator;
pub mod loader;
pub mod pagination;
pub mod server;
pub mod state;
pub mod telemetry;

// Pipeline stages
pub mod filter;
pub mod classify;
pub mod resolve;
pub mod series;
pub mod document;
pub mod pipeline;

use crate::config::{AppConfig, StoreArgs, ServeArgs};
use crate::server::Server;

/// Start the HTTP service with the given configuration.
pub async fn serve(store: &StoreArgs, serve: &ServeArgs) -> anyhow::Result<()> {
    let config = AppConfig::from_args(store, serve)?;
    Server::new(config).run().await
}

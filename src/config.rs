use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "indicator-api")]
#[command(about = "Serve public-health indicators as chart-ready documents", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub store: StoreArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Directory holding the ind_<id>/ indicator folders
    #[arg(long, env = "INDICATOR_DATA_DIR", default_value = "data", global = true)]
    pub data_dir: PathBuf,

    /// Directory holding GeoJSON map shapes (defaults to <data-dir>/maps)
    #[arg(long, env = "INDICATOR_MAPS_DIR", global = true)]
    pub maps_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP service
    Serve(ServeArgs),
    /// Run one indicator through the pipeline and print the result as JSON
    Render(RenderArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, env = "INDICATOR_LISTEN_ADDR", default_value = "0.0.0.0:8002")]
    pub listen_addr: String,

    #[arg(long, env = "INDICATOR_DEFAULT_LIMIT", default_value_t = 10)]
    pub default_limit: usize,

    #[arg(long, env = "INDICATOR_MAX_LIMIT", default_value_t = 100)]
    pub max_limit: usize,
}

#[derive(Args, Debug, Clone)]
pub struct RenderArgs {
    /// Indicator id (the <id> of ind_<id>)
    pub id: u64,

    /// Filter as key=value, e.g. nome_option_f7=2010 (repeatable)
    #[arg(long = "filter", value_parser = parse_key_value)]
    pub filters: Vec<(String, String)>,
}

fn parse_key_value(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}

/// Resolved service configuration, passed explicitly to the store and server.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub maps_dir: PathBuf,
    pub listen_addr: SocketAddr,
    pub default_limit: usize,
    pub max_limit: usize,
}

impl StoreArgs {
    pub fn maps_dir(&self) -> PathBuf {
        self.maps_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("maps"))
    }
}

impl AppConfig {
    pub fn from_args(store: &StoreArgs, serve: &ServeArgs) -> Result<Self> {
        let listen_addr = serve
            .listen_addr
            .to_socket_addrs()
            .context("invalid listen address")?
            .next()
            .context("listen address resolved to no targets")?;

        Ok(Self {
            data_dir: store.data_dir.clone(),
            maps_dir: store.maps_dir(),
            listen_addr,
            default_limit: serve.default_limit.max(1),
            max_limit: serve.max_limit.max(serve.default_limit.max(1)),
        })
    }
}

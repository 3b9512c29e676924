use anyhow::{Context, Result};
use clap::Parser;
use indicator_api::config::{Cli, Command};
use indicator_api::filter::FilterRequest;
use indicator_api::loader::IndicatorStore;
use indicator_api::{pipeline, telemetry};
use std::io::{self, Write};

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Serve(serve) => indicator_api::serve(&cli.store, &serve).await,
        Command::Render(render) => {
            let store = IndicatorStore::new(cli.store.data_dir.clone(), cli.store.maps_dir());
            let request = FilterRequest::from_pairs(render.filters);
            let output = pipeline::run(&store, render.id, &request)
                .with_context(|| format!("Failed to render indicator {}", render.id))?;

            // Write JSON to stdout
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            serde_json::to_writer_pretty(&mut handle, &output.response)
                .context("Failed to serialize response")?;
            writeln!(handle).context("Failed to write to stdout")?;
            handle.flush().context("Failed to flush stdout")?;
            Ok(())
        }
    }
}

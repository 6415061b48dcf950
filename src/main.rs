//! BIG-IP route controller (v1)
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌──────────────────────────────────────────────────────┐
//!                  │                 ROUTE CONTROLLER                     │
//!                  │                                                      │
//!  route seeds ────┼─▶┌──────────┐  RouteUpdate   ┌────────────────────┐  │
//!  (config file)   │  │ registry │───────────────▶│      router        │  │
//!                  │  │ (memory) │◀── snapshot ───│ (single worker)    │  │
//!                  │  └──────────┘                └─────────┬──────────┘  │
//!                  │                                        │             │
//!                  │                                        ▼             │
//!                  │                              ┌────────────────────┐  │
//!                  │                              │     resources      │  │
//!                  │                              │ builder + ordering │  │
//!                  │                              └─────────┬──────────┘  │
//!                  │                                        │ JSON        │
//!                  │                                        ▼             │
//!                  │                              ┌────────────────────┐  │
//!                  │                              │    sink (file)     │──┼──▶ driver
//!                  │                              └────────────────────┘  │
//!                  │                                                      │
//!                  │  ┌─────────┐  ┌───────────────┐  ┌───────────────┐   │
//!                  │  │ config  │  │ observability │  │   lifecycle   │   │
//!                  │  └─────────┘  └───────────────┘  └───────────────┘   │
//!                  └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use bigip_route_ctlr::config::loader::load_config;
use bigip_route_ctlr::lifecycle::startup::run_controller;
use bigip_route_ctlr::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "bigip-route-ctlr")]
#[command(about = "Translates route registrations into BIG-IP configuration", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: PathBuf,

    /// Override the output file path.
    #[arg(short, long)]
    output: Option<String>,

    /// Do not watch the config file for route seed changes.
    #[arg(long)]
    no_watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config(&cli.config)?;
    if let Some(output) = cli.output {
        config.output.path = output;
    }

    logging::init_logging(&config.observability);

    tracing::info!(
        url = %config.bigip.url,
        partitions = ?config.bigip.partitions,
        output = %config.output.path,
        routes = config.routes.len(),
        "bigip-route-ctlr v0.1.0 starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let watch_path = (!cli.no_watch).then(|| cli.config.clone());
    run_controller(config, watch_path).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

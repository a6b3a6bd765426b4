//! Toolmesh — boots a `RegistryManager` with the illustrative adapters
//! registered and exposes it over the API Bridge.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use toolmesh::adapters::{AgnoAdapter, DemoAdapter, FastMcpAdapter, HaystackAdapter, LlamaIndexAdapter, OwlAdapter};
use toolmesh::bridge::Bridge;
use toolmesh::cli::Cli;
use toolmesh::manager::{RegistryConfig, RegistryManager};
use toolmesh::setup_tracing;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = setup_tracing(&cli.log_level, cli.log_format.as_deref()) {
        eprintln!("failed to setup tracing: {e}");
        return ExitCode::FAILURE;
    }

    let config = match RegistryConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let manager = Arc::new(RegistryManager::new(config));
    for adapter in illustrative_adapters() {
        if let Err(e) = manager.registry().register_adapter(adapter) {
            error!("failed to register adapter: {e}");
            return ExitCode::FAILURE;
        }
    }

    if let Err(e) = manager.start().await {
        error!("failed to start registry manager: {e}");
        return ExitCode::FAILURE;
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %cli.host,
        port = cli.port,
        "starting toolmesh"
    );

    let bridge = Bridge::new(manager, cli.host, cli.port);
    if let Err(e) = bridge.run().await {
        error!("bridge error: {e}");
        return ExitCode::FAILURE;
    }

    info!("toolmesh shutdown complete");
    ExitCode::SUCCESS
}

fn illustrative_adapters() -> Vec<Arc<dyn toolmesh::adapter::Adapter>> {
    vec![
        Arc::new(DemoAdapter::new()),
        Arc::new(AgnoAdapter::new()),
        Arc::new(LlamaIndexAdapter::new()),
        Arc::new(OwlAdapter::new()),
        Arc::new(FastMcpAdapter::new()),
        Arc::new(HaystackAdapter::new()),
    ]
}

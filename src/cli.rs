//! Command-line interface for the API Bridge binary.

use std::path::PathBuf;

use clap::Parser;

/// Toolmesh — framework-agnostic tool registry and execution platform.
#[derive(Parser, Debug)]
#[command(name = "toolmesh")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long, env = "REGISTRY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, default_value_t = 8080, env = "REGISTRY_PORT")]
    pub port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1", env = "REGISTRY_HOST")]
    pub host: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "REGISTRY_LOG_LEVEL")]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, env = "REGISTRY_LOG_FORMAT")]
    pub log_format: Option<String>,
}

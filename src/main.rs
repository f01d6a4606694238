//! distance-server CLI
//!
//! Starts the distance metrics web service.
//!
//! Usage:
//!   distance-server [OPTIONS]

use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use distance_server::{ServiceConfig, load_config, load_config_file, web::start_server};

/// distance-server - Distance metrics, charts and exports over HTTP
#[derive(Parser, Debug)]
#[command(name = "distance-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to listen on (default: 127.0.0.1, or the config file value)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (default: 5001, or the config file value)
    #[arg(short, long)]
    port: Option<u16>,

    /// Config file path (default: search for distance-server.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Open the front-end in a browser once the server is listening
    #[arg(long)]
    open: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    init_tracing(args.verbose);

    let mut config = load_service_config(&args)?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if args.open {
        config.server.open_browser = true;
    }
    debug!(?config, "effective configuration");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(start_server(config))
}

/// `RUST_LOG` wins; otherwise `info`, or `debug` with `--verbose`
fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_service_config(args: &Args) -> Result<ServiceConfig, Box<dyn std::error::Error + Send + Sync>> {
    if let Some(path) = &args.config {
        let config = load_config_file(path)?;
        info!(path = %path.display(), "loaded configuration");
        return Ok(config);
    }

    let cwd = std::env::current_dir()?;
    Ok(load_config(&cwd)?)
}

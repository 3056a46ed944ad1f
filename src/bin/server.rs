//! StrataKV Server Binary
//!
//! Recovers the working directory and starts the TCP server.

use std::path::PathBuf;

use clap::Parser;
use stratakv::network::Server;
use stratakv::{Config, Engine, EngineHandle};
use tracing_subscriber::{fmt, EnvFilter};

/// StrataKV Server
#[derive(Parser, Debug)]
#[command(name = "stratakv-server")]
#[command(about = "Embeddable log-structured key-value store server")]
#[command(version)]
struct Args {
    /// Properties file to load configuration from (CLI flags override it)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Working directory for all databases
    #[arg(short, long)]
    working_dir: Option<PathBuf>,

    /// Listen address (host:port)
    #[arg(short, long)]
    listen: Option<String>,

    /// Maximum concurrent connections
    #[arg(long)]
    max_connections: Option<usize>,

    /// Segment size ceiling in bytes
    #[arg(long)]
    segment_size_limit: Option<u64>,

    /// Per-table cache capacity in entries
    #[arg(long)]
    cache_capacity: Option<usize>,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,stratakv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match Config::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!("Failed to load config: {}", e);
                std::process::exit(1);
            }
        },
        None => Config::default(),
    };

    if let Some(working_dir) = args.working_dir {
        config.working_dir = working_dir;
    }
    if let Some(listen) = args.listen {
        config.listen_addr = listen;
    }
    if let Some(max_connections) = args.max_connections {
        config.max_connections = max_connections;
    }
    if let Some(segment_size_limit) = args.segment_size_limit {
        config.segment_size_limit = segment_size_limit;
    }
    if let Some(cache_capacity) = args.cache_capacity {
        config.cache_capacity = cache_capacity;
    }

    tracing::info!("StrataKV Server v{}", stratakv::VERSION);
    tracing::info!("Working directory: {}", config.working_dir.display());
    tracing::info!("Listen address: {}", config.listen_addr);

    // Recovery runs here; a corrupt segment aborts startup entirely.
    let engine = match Engine::open(config.clone()) {
        Ok(engine) => engine,
        Err(e) => {
            tracing::error!("Failed to open engine: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Engine initialized with {} database(s)", engine.database_count());

    let handle = EngineHandle::spawn(engine);
    let server = Server::new(config, handle);

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}

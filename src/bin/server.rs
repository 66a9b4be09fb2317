//! kvgate Server Binary
//!
//! Starts the client-facing gateway in front of a backend.

use std::sync::Arc;

use clap::{Parser, ValueEnum};
use kvgate::network::Server;
use kvgate::{BackendClient, Config, Transport};
use tracing_subscriber::{fmt, EnvFilter};

/// kvgate Server
#[derive(Parser, Debug)]
#[command(name = "kvgate-server")]
#[command(about = "JSON command gateway for a line-oriented key-value backend")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:8880")]
    listen: String,

    /// Client framing
    #[arg(long, value_enum, default_value_t = TransportArg::Websocket)]
    transport: TransportArg,

    /// Backend host
    #[arg(long, default_value = "127.0.0.1")]
    backend_host: String,

    /// Backend port
    #[arg(long, default_value = "8080")]
    backend_port: u16,

    /// Largest client frame in bytes
    #[arg(short = 'f', long, default_value = "4096")]
    max_frame_size: usize,

    /// Longest backend command in bytes
    #[arg(long, default_value = "4096")]
    max_command_size: usize,

    /// Backend connect/send/receive timeout in milliseconds (0 disables)
    #[arg(short = 't', long, default_value = "5000")]
    backend_timeout_ms: u64,

    /// Idle backend connections to keep (0 opens one per request)
    #[arg(short = 'p', long, default_value = "8")]
    pool_size: usize,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TransportArg {
    /// One JSON command per WebSocket message stream
    Websocket,
    /// Raw TCP byte stream
    Tcp,
}

impl From<TransportArg> for Transport {
    fn from(arg: TransportArg) -> Self {
        match arg {
            TransportArg::Websocket => Transport::WebSocket,
            TransportArg::Tcp => Transport::Tcp,
        }
    }
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,kvgate=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("kvgate Server v{}", kvgate::VERSION);
    tracing::info!("Listen address: {} ({:?})", args.listen, args.transport);
    tracing::info!("Backend: {}:{}", args.backend_host, args.backend_port);

    // Build config from args
    let config = Config::builder()
        .listen_addr(&args.listen)
        .transport(args.transport.into())
        .backend_host(&args.backend_host)
        .backend_port(args.backend_port)
        .max_frame_size(args.max_frame_size)
        .max_command_size(args.max_command_size)
        .backend_timeout_ms(args.backend_timeout_ms)
        .backend_pool_size(args.pool_size)
        .max_connections(args.max_connections)
        .build();

    let backend = match BackendClient::new(&config) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            tracing::error!("Failed to set up backend client: {}", e);
            std::process::exit(1);
        }
    };

    let server = match Server::bind(config, backend) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}

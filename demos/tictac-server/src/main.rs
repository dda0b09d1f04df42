//! Reference server for the tic-tac-toe client.
//!
//! ```bash
//! tictac-server --bind 0.0.0.0:8080 --accounts accounts.json
//! tictac-server --transport websocket --idle-timeout 60
//! ```
//!
//! Log verbosity comes from `RUST_LOG` (default `info`).

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use duoplex::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Session server for two-player turn-based games
#[derive(Parser, Debug)]
#[command(name = "tictac-server")]
#[command(version)]
struct Args {
    /// Address to listen on [default: 127.0.0.1:8080]
    #[arg(long)]
    bind: Option<String>,

    /// Wire framing: tcp, or websocket (alias ws) [default: tcp]
    #[arg(long)]
    transport: Option<TransportKind>,

    /// JSON file accounts are loaded from and saved to
    #[arg(long)]
    accounts: Option<PathBuf>,

    /// Disconnect clients silent for this many seconds (0 disables)
    #[arg(long, default_value_t = 0)]
    idle_timeout: u64,

    /// Maximum concurrent connections [default: 1000]
    #[arg(long)]
    max_connections: Option<usize>,

    /// Seconds a peer may take to finish the WebSocket upgrade [default: 10]
    #[arg(long)]
    handshake_timeout: Option<u64>,
}

impl Args {
    /// Lays the flags over [`ServerConfig::default`].
    fn into_config(self) -> ServerConfig {
        let mut config = ServerConfig::default();
        if let Some(bind) = self.bind {
            config.bind = bind;
        }
        if let Some(transport) = self.transport {
            config.transport = transport;
        }
        config.accounts_path = self.accounts;
        config.idle_timeout = (self.idle_timeout > 0).then(|| Duration::from_secs(self.idle_timeout));
        if let Some(max) = self.max_connections {
            config.max_connections = max;
        }
        if let Some(secs) = self.handshake_timeout {
            config.handshake_timeout = Duration::from_secs(secs);
        }
        config
    }
}

#[tokio::main]
async fn main() {
    init_logging();
    let config = Args::parse().into_config();

    tracing::info!(
        bind = %config.bind,
        transport = %config.transport,
        accounts = ?config.accounts_path,
        "starting tictac-server"
    );

    let server = match ServerBuilder::from_config(config).build().await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "failed to start");
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run_until(tokio::signal::ctrl_c()).await {
        tracing::error!(error = %e, "server stopped with error");
        std::process::exit(1);
    }
    tracing::info!("bye");
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(true).init();
}

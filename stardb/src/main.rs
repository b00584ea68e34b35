//! star-db server binary.
//!
//! Listens on all interfaces, port 8080, and appends every request to
//! `star-db.log` in the working directory.

use stardb::{Config, Server};
use tracing_subscriber::{EnvFilter, fmt};

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(false).init();

    tracing::info!("star-db v{}", stardb::VERSION);

    let config = Config::default();

    let mut server = match Server::bind(config) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("failed to start: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("server error: {}", e);
        std::process::exit(1);
    }
}

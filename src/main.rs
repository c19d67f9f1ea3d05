//! aliasd entry point
//!
//! Parses flags, assembles the chosen store backend, and runs the HTTP
//! server until a termination signal arrives.

use std::process;
use std::sync::Arc;

use aliasd::account::{LogBackedStore, MemoryStore, RecordStore, SNAPSHOT_FILE_NAME};
use aliasd::cli::{Backend, Cli};
use aliasd::http_server::{AppState, HttpServer, HttpServerConfig};
use aliasd::logstore::{LogStore, StoreConfig};
use aliasd::observability::Logger;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();
    let logger = Logger::new(cli.log_level);

    let (store, memory): (Arc<dyn RecordStore>, Option<Arc<MemoryStore>>) =
        match cli.backend {
            Backend::Log => {
                let config = StoreConfig {
                    sync: cli.sync,
                    ..Default::default()
                };
                let log_store = match LogStore::open_with_config(
                    &cli.data_dir,
                    config,
                    logger.clone(),
                ) {
                    Ok(store) => store,
                    Err(err) => {
                        logger.fatal(
                            "store_open_failed",
                            &[("error", &err.to_string())],
                        );
                        process::exit(1);
                    }
                };
                (Arc::new(LogBackedStore::new(log_store)), None)
            }
            Backend::Memory => {
                let memory = Arc::new(MemoryStore::new());
                let snapshot = cli.data_dir.join(SNAPSHOT_FILE_NAME);
                if let Err(err) = memory.initialize_persistence(&snapshot) {
                    logger.fatal("store_open_failed", &[("error", &err.to_string())]);
                    process::exit(1);
                }
                (memory.clone() as Arc<dyn RecordStore>, Some(memory))
            }
        };

    let state = Arc::new(AppState {
        store,
        logger: logger.clone(),
    });

    let config = HttpServerConfig::new(cli.host, cli.port);
    let server = HttpServer::with_config(config, state);

    logger.info("listening", &[("addr", &server.socket_addr())]);
    if let Err(err) = server.start().await {
        logger.fatal("server_failed", &[("error", &err.to_string())]);
        process::exit(1);
    }

    if let Some(memory) = memory {
        if let Err(err) = memory.shutdown() {
            logger.error("store_shutdown_failed", &[("error", &err.to_string())]);
        }
    }
}

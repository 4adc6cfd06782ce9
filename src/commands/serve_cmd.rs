use std::process::ExitCode;
use std::sync::Arc;

use tracing::{info, warn};

use crate::commands::base_commands::Commands;
use crate::services::api::{api, SharedStore};
use crate::services::server_config::ServerConfig;
use crate::services::sqlite_store::SqliteScenarioStore;

pub async fn serve_command(cmd: Commands) -> ExitCode {
    let Commands::Serve {
        config,
        port,
        database,
    } = cmd
    else {
        return ExitCode::SUCCESS;
    };

    let mut server_config = match ServerConfig::load(config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load server config: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(port) = port {
        server_config.port = port;
    }
    if let Some(database) = database {
        server_config.database_path = database;
    }

    let store = match SqliteScenarioStore::open(
        &server_config.database_path,
        server_config.busy_timeout(),
    ) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            eprintln!("Failed to open scenario database: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = store.migrate() {
        eprintln!("Failed to prepare scenario database: {e}");
        return ExitCode::FAILURE;
    }

    let shared: SharedStore = store.clone();
    let bound = warp::serve(api(shared)).try_bind_with_graceful_shutdown(
        server_config.socket_addr(),
        async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {e}");
                std::future::pending::<()>().await;
            }
        },
    );
    let (addr, server) = match bound {
        Ok(bound) => bound,
        Err(e) => {
            eprintln!("Failed to bind {}: {e}", server_config.socket_addr());
            return ExitCode::FAILURE;
        }
    };

    info!(%addr, database = %server_config.database_path, "server listening");
    server.await;
    info!("server stopped");

    match Arc::try_unwrap(store) {
        Ok(store) => {
            if let Err(e) = store.close() {
                eprintln!("Failed to close scenario database: {e}");
                return ExitCode::FAILURE;
            }
        }
        Err(_) => warn!("scenario database still in use at shutdown"),
    }
    ExitCode::SUCCESS
}

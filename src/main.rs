pub mod config;
pub mod err;
pub mod models;
pub mod store;
pub mod students;

use std::sync::Arc;

use crate::config::Config;
use crate::err::Error;
use crate::store::{MongoStore, SharedStore, COLLECTION_NAME, DATABASE_NAME};

pub type Payload<T> = Result<T, Error>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env()?;
    let store: SharedStore = match MongoStore::connect(&config.mongodb_uri).await {
        Ok(store) => Arc::new(store),
        Err(err) => {
            log::error!("Could not connect to the student store: {:#}", err);
            return Err(err);
        }
    };
    log::info!("Using collection {}.{}", DATABASE_NAME, COLLECTION_NAME);

    let app = students::router(store);

    log::info!("Starting student registry on http://{}", config.listen_addr);
    axum::Server::bind(&config.listen_addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    log::info!("Student registry stopped");
    Ok(())
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            log::error!("Could not listen for Ctrl-C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                log::error!("Could not listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = sigterm => {}
    }
    log::info!("Shutdown requested, draining in-flight requests");
}

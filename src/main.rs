use std::process::ExitCode;
use std::sync::Arc;

use humans::{Config, Error, HumanStore, PgHumanStore, Server, api};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Error> {
    let config = Config::from_env()?;

    let store = Arc::new(PgHumanStore::connect(&config.database_url, config.store).await?);
    if let Err(e) = store.bootstrap().await {
        store.close().await;
        return Err(e.into());
    }

    let served = Server::bind(config.bind_addr)
        .drain_timeout(config.drain_timeout)
        .serve(api::app(Arc::clone(&store) as api::SharedStore))
        .await;

    store.close().await;
    served
}

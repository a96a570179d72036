use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use rickshaw::config::{load_dotenv, Config, StoreKind};
use rickshaw::db::PgStore;
use rickshaw::engine::Engine;
use rickshaw::error::Error;
use rickshaw::notify::Hub;
use rickshaw::server::serve;
use rickshaw::store::{MemoryStore, Store};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let env_file = load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match env_file {
        Some(path) => tracing::info!("loaded {}", path.display()),
        None => tracing::debug!("no .env file loaded"),
    }

    let config = Config::from_env()?;

    let store: Arc<dyn Store> = match config.store {
        StoreKind::Postgres => {
            Arc::new(PgStore::connect(&config.database_url, config.database_max_connections).await?)
        }
        StoreKind::Memory => {
            tracing::warn!("using the in-memory store, nothing will survive a restart");
            Arc::new(MemoryStore::new())
        }
    };

    let hub = Arc::new(Hub::new(config.topic_capacity));
    let engine = Engine::new(store, hub, config.transition_policy)?;

    serve(engine, config.listen_addr).await
}

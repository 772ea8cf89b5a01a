use std::sync::Arc;

use truck_packer::api::{self, ApiState};
use truck_packer::config::{AppConfig, StoreConfig};
use truck_packer::store::{ConfigurationStore, JsonFileStore, MemoryStore};

fn open_store(config: &StoreConfig) -> Arc<dyn ConfigurationStore> {
    let Some(path) = config.path() else {
        println!("💾 Saved configurations are kept in memory only");
        return Arc::new(MemoryStore::new());
    };

    match JsonFileStore::open(path) {
        Ok(store) => Arc::new(store),
        Err(err) => {
            eprintln!("❌ {}. Falling back to an in-memory store.", err);
            Arc::new(MemoryStore::new())
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = dotenvy::dotenv() {
        if !matches!(err, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            eprintln!("⚠️ Could not load .env: {}", err);
        }
    }

    let app_config = AppConfig::from_env();
    let store = open_store(&app_config.store);
    let state = ApiState::new(app_config.optimizer.clone(), store);

    println!("🚀 Truck packer starting...");
    api::start_api_server(app_config.api, state).await;
}

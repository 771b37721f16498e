//! `assistd serve` — Start the HTTP API server.

use assistd_config::{AppConfig, StoreBackend};

pub async fn run(
    mut config: AppConfig,
    port_override: Option<u16>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    // The default database lives in the config dir, which may not exist yet.
    if config.store.backend == StoreBackend::Sqlite && config.store.database_url.is_none() {
        std::fs::create_dir_all(AppConfig::config_dir())?;
    }

    println!("assistd");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Store:     {}", config.store.backend);
    println!("   Provider:  {} ({})", config.default_provider, config.default_model);

    assistd_gateway::start(config).await
}

//! `assistd status` — Show the effective configuration.

use assistd_config::{AppConfig, StoreBackend};

pub fn run(config: &AppConfig) {
    println!("assistd Status");
    println!("==============");
    println!("  Config dir:   {}", AppConfig::config_dir().display());
    println!("  Provider:     {}", config.default_provider);
    println!("  Model:        {}", config.default_model);
    println!("  Temperature:  {}", config.default_temperature);
    println!("  API key:      {}", if config.has_api_key() { "configured" } else { "missing" });
    println!("  Store:        {}", config.store.backend);
    if config.store.backend == StoreBackend::Sqlite {
        println!("  Database:     {}", config.store.database_url());
    }
    println!("  Context:      {} messages", config.agent.context_window);
    match config.agent.max_agents_per_user {
        0 => println!("  Agent quota:  unlimited"),
        n => println!("  Agent quota:  {n} per user"),
    }
    println!("  Gateway:      {}:{}", config.gateway.host, config.gateway.port);
    println!("  Default user: {}", config.gateway.default_user);
    println!("  Log format:   {}", config.logging.format);

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file — run `assistd onboard` first");
    }
}

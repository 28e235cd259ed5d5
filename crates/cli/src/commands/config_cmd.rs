//! `ragctx config` — Show the effective configuration.

use ragctx_config::AppConfig;

pub fn run(defaults: bool) -> Result<(), Box<dyn std::error::Error>> {
    if defaults {
        println!("{}", AppConfig::default_toml());
        return Ok(());
    }

    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    println!("# {}", AppConfig::config_dir().join("config.toml").display());
    if !config.has_api_key() {
        println!("# warning: no API key set (set RAGCTX_API_KEY or retrieval.api_key)");
    }

    if config.retrieval.api_key.is_some() {
        config.retrieval.api_key = Some("***".into());
    }
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

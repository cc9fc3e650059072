//! `wayfarer maps`: start the maps façade.

use wayfarer_config::AppConfig;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.maps.port = port;
    }

    println!("🗺️  Wayfarer Maps");
    println!("   Listening: {}:{}", config.maps.host, config.maps.port);
    println!("   Language:  {}", config.maps.lang);

    wayfarer_gateway::start_maps(&config).await?;

    Ok(())
}

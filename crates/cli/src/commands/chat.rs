//! `wayfarer chat`: start the chat façade.

use wayfarer_config::AppConfig;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.chat.port = port;
    }

    println!("🧭 Wayfarer Chat");
    println!("   Listening: {}:{}", config.chat.host, config.chat.port);
    println!("   Model:     {} ({})", config.chat.model, config.chat.provider_name);

    wayfarer_gateway::start_chat(&config).await?;

    Ok(())
}

//! `wayfarer config`: configuration management commands.

use wayfarer_config::AppConfig;

pub fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    match AppConfig::load() {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");

            let warnings = warnings(&config);
            if warnings.is_empty() {
                println!("   ✅ All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   ⚠️  {w}");
                }
            }

            println!();
            println!("   Provider:  {}", config.chat.provider_name);
            println!("   Model:     {}", config.chat.model);
            println!("   Chat:      {}:{}", config.chat.host, config.chat.port);
            println!("   Maps:      {}:{}", config.maps.host, config.maps.port);
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

/// Settings that load fine but leave an endpoint unusable.
fn warnings(config: &AppConfig) -> Vec<&'static str> {
    let mut warnings = Vec::new();

    if config.chat.api_key.is_none() {
        warnings.push("No LLM API key set (AI_SECRET_KEY); the chat service will not start");
    }
    if config.chat.backend_key.is_none() {
        warnings.push("No backend key set (AI_BACKEND_KEY); chat requests will fail with 500");
    }
    if config.maps.geocoder_key.is_none() {
        warnings.push("No geocoder key set (GEOCODER_KEY)");
    }
    if config.maps.geosuggest_key.is_none() {
        warnings.push("No suggest key set (GEOSUGGEST_KEY)");
    }
    if config.maps.maps_api_key.is_none() {
        warnings.push("No map display key set (YANDEX_MAPS_API_KEY); /api/maps-key returns null");
    }

    warnings
}

pub fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let toml_str = toml::to_string_pretty(&config.redacted())?;
    println!("{toml_str}");
    Ok(())
}

pub fn path() {
    println!("{}", AppConfig::config_path().display());
}

//! `wayfarer doctor`: diagnose configuration and keys.

use wayfarer_config::AppConfig;

pub fn run() {
    println!("🩺 Wayfarer Doctor: System Diagnostics");
    println!("======================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_path();
    if config_path.exists() {
        println!("  ✅ Config file found at {}", config_path.display());
    } else {
        println!("  ℹ️  No config file at {}; using defaults", config_path.display());
    }

    match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Configuration valid");
            for (label, present) in key_report(&config) {
                if present {
                    println!("  ✅ {label} configured");
                } else {
                    println!("  ⚠️  {label} missing");
                    issues += 1;
                }
            }
        }
        Err(e) => {
            println!("  ❌ Configuration invalid: {e}");
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }
}

/// Which secrets are present, by their environment variable name.
fn key_report(config: &AppConfig) -> [(&'static str, bool); 5] {
    [
        ("AI_SECRET_KEY", config.chat.api_key.is_some()),
        ("AI_BACKEND_KEY", config.chat.backend_key.is_some()),
        ("GEOCODER_KEY", config.maps.geocoder_key.is_some()),
        ("GEOSUGGEST_KEY", config.maps.geosuggest_key.is_some()),
        ("YANDEX_MAPS_API_KEY", config.maps.maps_api_key.is_some()),
    ]
}

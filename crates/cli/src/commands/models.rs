//! `cockpit models` — List models offered by the configured provider.

use cockpit_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let router = cockpit_providers::build_from_config(&config);
    let provider = router
        .default_provider()
        .ok_or("No default provider configured")?;

    let models = provider
        .list_models()
        .await
        .map_err(|e| format!("Cannot reach {}: {e}", provider.name()))?;

    if models.is_empty() {
        println!("  {} reports no models.", provider.name());
        return Ok(());
    }

    println!("  Models on {}:", provider.name());
    for model in models {
        let marker = if model == config.default_model { " (default)" } else { "" };
        println!("    {model}{marker}");
    }
    Ok(())
}

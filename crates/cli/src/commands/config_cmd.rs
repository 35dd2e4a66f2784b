//! `soulturn config`: Configuration commands.

use std::path::Path;

use anyhow::Context;
use soulturn_config::AppConfig;

/// Load the configuration (defaults plus environment overrides).
pub fn load(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::load_with_env(path),
        None => AppConfig::load(),
    };
    config.context("failed to load configuration")
}

pub fn print_default() {
    print!("{}", AppConfig::default_toml());
}

/// Validate and summarize the effective configuration.
pub fn show(path: Option<&Path>) -> anyhow::Result<()> {
    println!("🔍 Validating configuration...");
    let config = load(path)?;
    println!("   ✅ Config parsed successfully");

    let mut warnings = Vec::new();
    if config.welcome.holder_verify_channel.trim().is_empty() {
        warnings.push("welcome.holder_verify_channel is empty (set SOULTURN_HOLDER_VERIFY_CHANNEL)");
    }
    if config.memory.backend == "none" {
        warnings.push("memory.backend = \"none\": users will not be remembered");
    }
    if config.turn.rag_topics.trim().is_empty() {
        warnings.push("turn.rag_topics is empty: knowledge is never consulted");
    }

    if warnings.is_empty() {
        println!("   ✅ All checks passed");
    } else {
        println!();
        for w in &warnings {
            println!("   ⚠️  {w}");
        }
    }

    println!();
    println!("   Soul:      {}", config.soul.name);
    println!("   Models:    {} / {}", config.models.fast, config.models.quality);
    println!("   Memory:    {}", config.memory.backend);
    println!(
        "   Knowledge: {}",
        config
            .knowledge
            .path
            .as_ref()
            .map_or_else(|| "none".to_string(), |p| p.display().to_string())
    );
    println!("   Parts:     up to {}", config.turn.max_message_parts);
    Ok(())
}

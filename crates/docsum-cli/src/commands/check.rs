//! Check command - verify the provider is reachable.

use super::{load_config, Status};
use anyhow::{Context, Result};
use colored::Colorize;
use docsum_config::{ConfigSource, ProviderKind};
use docsum_llm::OllamaClient;
use tokio::runtime::Runtime;

pub fn run(source: &ConfigSource) -> Result<Status> {
    let config = load_config(source)?;
    config.validate().context("Invalid configuration")?;

    let provider =
        docsum_llm::from_config(&config.provider).context("Failed to create provider client")?;
    let rt = Runtime::new().context("Failed to create async runtime")?;

    println!(
        "Checking {} at {}",
        provider.name().cyan(),
        config.provider.base_url()
    );

    if !rt.block_on(provider.is_available()) {
        println!("  {} Endpoint unreachable or rejected the credentials", "✗".red());
        return Ok(Status::Failures);
    }
    println!("  {} Endpoint reachable", "✓".green());

    if config.provider.kind == ProviderKind::Ollama {
        let client = OllamaClient::from_config(&config.provider)?;
        let has_model = rt
            .block_on(client.has_model(&config.provider.model))
            .context("Failed to list models")?;
        if !has_model {
            println!(
                "  {} Model '{}' not found. Run: {}",
                "✗".red(),
                config.provider.model,
                format!("ollama pull {}", config.provider.model).cyan()
            );
            return Ok(Status::Failures);
        }
        println!("  {} Model '{}' available", "✓".green(), config.provider.model);
    }

    Ok(Status::Success)
}

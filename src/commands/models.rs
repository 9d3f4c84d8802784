use anyhow::Result;
use colored::Colorize;

use crate::config::Config;
use crate::llm::ProviderKind;

/// List the models offered for a provider, marking the configured default
pub async fn list(provider: Option<ProviderKind>) -> Result<()> {
    let config = Config::load()?;
    let provider = provider.unwrap_or(config.provider);
    let default = if provider == config.provider {
        config.model()
    } else {
        provider.default_model().to_string()
    };

    println!("\n{} ({})\n", "Models".bold(), provider.to_string().cyan());

    for (id, desc) in provider.models() {
        let marker = if *id == default {
            "●".green().to_string()
        } else {
            " ".to_string()
        };
        println!("  {} {:<36} {}", marker, id.yellow(), desc.dimmed());
    }

    if !provider.models().iter().any(|(id, _)| *id == default) {
        println!("  {} {:<36} {}", "●".green(), default.yellow(), "custom".dimmed());
    }

    println!();
    Ok(())
}

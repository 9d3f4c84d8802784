use anyhow::Result;
use colored::Colorize;
use inquire::{Password, Select};

use crate::config::Config;
use crate::credentials;
use crate::ingest::UnsupportedPolicy;
use crate::llm::ProviderKind;

pub async fn run() -> Result<()> {
    println!();
    println!(
        "    {}",
        "╭──────────────────────────────────────────────────────╮".bright_black()
    );
    println!(
        "    {}                    {}                    {}",
        "│".bright_black(),
        "⚙️  SETTINGS".bold().white(),
        "│".bright_black()
    );
    println!(
        "    {}",
        "╰──────────────────────────────────────────────────────╯".bright_black()
    );
    println!();

    let mut config = Config::load()?;

    let options = vec![
        "🔑  Set API Key        │ Store a key for the current provider",
        "🌐  Select Provider    │ OpenRouter, Groq or local Ollama",
        "🤖  Select Model       │ Choose default LLM",
        "📎  Unsupported Files  │ Decode as text or insert a placeholder",
        "📋  View Settings      │ See current configuration",
        "←   Back",
    ];

    loop {
        let selection =
            Select::new("What would you like to configure?", options.clone()).prompt();

        let selection = match selection {
            Ok(s) => s,
            Err(inquire::InquireError::OperationCanceled)
            | Err(inquire::InquireError::OperationInterrupted) => break,
            Err(e) => return Err(e.into()),
        };

        let result = match selection {
            s if s.contains("Set API Key") => set_api_key(&mut config),
            s if s.contains("Select Provider") => select_provider(&mut config),
            s if s.contains("Select Model") => select_model(&mut config),
            s if s.contains("Unsupported Files") => select_unsupported_policy(&mut config),
            s if s.contains("View Settings") => {
                view_config(&config);
                Ok(())
            }
            s if s.contains("Back") => break,
            _ => Ok(()),
        };

        if let Err(e) = result {
            if !e.to_string().contains("cancelled") {
                eprintln!("{} {}", "Error:".red(), e);
            }
        }

        println!();
    }

    Ok(())
}

fn set_api_key(config: &mut Config) -> Result<()> {
    let adapter = config.provider.adapter(None);
    let Some(key_name) = adapter.credential_key() else {
        println!(
            "{} {} does not need an API key.",
            "Note:".yellow(),
            adapter.name()
        );
        return Ok(());
    };

    println!(
        "\n{} The key is saved to {} as {}. An entry in the secrets file takes precedence.",
        "Tip:".yellow(),
        "config.toml".cyan(),
        key_name.cyan()
    );

    let key = Password::new(&format!("Enter your {} API key:", adapter.name()))
        .without_confirmation()
        .prompt()?;

    if key.trim().is_empty() {
        println!("{}", "Cancelled.".dimmed());
        return Ok(());
    }

    config.set_api_key(config.provider, key.trim().to_string());
    config.save()?;

    println!("{} API key saved!", "✓".green());

    Ok(())
}

fn select_provider(config: &mut Config) -> Result<()> {
    let options: Vec<String> = ProviderKind::ALL.iter().map(|p| p.to_string()).collect();
    let selection = Select::new("Select provider:", options).prompt()?;

    let provider = ProviderKind::ALL
        .iter()
        .copied()
        .find(|p| p.to_string() == selection)
        .unwrap_or_default();

    if provider != config.provider {
        config.provider = provider;
        // Model ids are provider specific
        config.default_model = None;
    }
    config.save()?;

    println!(
        "{} Provider set to {} (model {})",
        "✓".green(),
        provider.to_string().yellow(),
        config.model().yellow()
    );

    Ok(())
}

fn select_model(config: &mut Config) -> Result<()> {
    let model_options: Vec<String> = config
        .provider
        .models()
        .iter()
        .map(|(id, desc)| format!("{} - {}", id, desc))
        .collect();

    let selection = Select::new("Select default model:", model_options).prompt()?;

    // Extract model ID from selection
    let Some(model_id) = selection.split(" - ").next().map(str::to_string) else {
        return Ok(());
    };

    config.default_model = Some(model_id.clone());
    config.save()?;

    println!("{} Default model set to {}", "✓".green(), model_id.yellow());

    Ok(())
}

fn select_unsupported_policy(config: &mut Config) -> Result<()> {
    let options = vec![
        UnsupportedPolicy::PlaceholderText,
        UnsupportedPolicy::DecodeAsText,
    ];
    let selection = Select::new("Files with an unknown extension:", options).prompt()?;

    config.unsupported_files = selection;
    config.save()?;

    println!("{} Unsupported files: {}", "✓".green(), selection.to_string().yellow());

    Ok(())
}

fn view_config(config: &Config) {
    println!("\n{}", "Current Configuration:".bold());
    println!("{}", "─".repeat(30).dimmed());

    let adapter = config.provider.adapter(config.endpoint.as_deref());

    println!("  Provider: {}", config.provider.to_string().cyan());
    println!("  Endpoint: {}", adapter.endpoint());

    let api_status = match adapter.credential_key() {
        None => "not needed".dimmed().to_string(),
        Some(key) => match config
            .credential_sources()
            .ok()
            .and_then(|sources| credential_origin(key, &sources))
        {
            Some(origin) => format!("configured ({})", origin).green().to_string(),
            None => format!("not set ({})", key).red().to_string(),
        },
    };
    println!("  API Key: {}", api_status);

    println!("  Model: {}", config.model());
    println!("  Timeout: {}s", config.timeout_secs);
    println!("  Unsupported files: {}", config.unsupported_files);
    println!(
        "  Max context: {}",
        config
            .max_context_chars
            .map(|n| format!("{} chars", n))
            .unwrap_or_else(|| "unlimited".to_string())
    );

    if let Ok(path) = Config::config_path() {
        println!("  Config file: {}", path.display().to_string().dimmed());
    }

    if let Ok(path) = Config::secrets_path() {
        println!("  Secrets file: {}", path.display().to_string().dimmed());
    }
}

/// Describe the first source that provides the credential
fn credential_origin(key: &str, sources: &[credentials::CredentialSource]) -> Option<String> {
    sources
        .iter()
        .find(|source| credentials::resolve(key, std::slice::from_ref(*source)).is_some())
        .map(|source| source.describe())
}

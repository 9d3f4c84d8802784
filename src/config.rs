use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::context::ContextOptions;
use crate::credentials::CredentialSource;
use crate::ingest::UnsupportedPolicy;
use crate::llm::ProviderKind;

/// Environment variable pointing at a deployment secrets file
pub const SECRETS_ENV: &str = "DOCQA_SECRETS";

/// Reference timeout for a single chat request
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderKind,
    pub default_model: Option<String>,
    /// Override for the provider's chat endpoint
    pub endpoint: Option<String>,
    pub timeout_secs: u64,
    pub unsupported_files: UnsupportedPolicy,
    pub max_context_chars: Option<usize>,
    /// API keys keyed by credential name, e.g. `OPENROUTER_API_KEY`
    pub api_keys: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            default_model: None,
            endpoint: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            unsupported_files: UnsupportedPolicy::default(),
            max_context_chars: None,
            api_keys: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let base = dirs::config_dir().context("Could not determine config directory")?;
        Ok(base.join("docqa"))
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Secrets file: `$DOCQA_SECRETS` if set, otherwise `secrets.toml` next to the config
    pub fn secrets_path() -> Result<PathBuf> {
        match std::env::var_os(SECRETS_ENV) {
            Some(path) if !path.is_empty() => Ok(PathBuf::from(path)),
            _ => Ok(Self::config_dir()?.join("secrets.toml")),
        }
    }

    /// Load config from file, or return default if not found
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config from {:?}", path))?;
            Self::parse(&content)
        } else {
            Ok(Config::default())
        }
    }

    /// Parse and validate config file content
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).with_context(|| "Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if let Some(endpoint) = &self.endpoint {
            let url = url::Url::parse(endpoint)
                .with_context(|| format!("Invalid endpoint URL: {}", endpoint))?;
            if !matches!(url.scheme(), "http" | "https") {
                anyhow::bail!(
                    "Unsupported endpoint scheme: {}. Only http and https are allowed.",
                    url.scheme()
                );
            }
        }
        if self.timeout_secs == 0 {
            anyhow::bail!("timeout_secs must be greater than zero");
        }
        Ok(())
    }

    /// Save config to file with secure permissions (600)
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        let dir = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Config path has no parent directory"))?;

        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create config directory {:?}", dir))?;

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&path, &content)
            .with_context(|| format!("Failed to write config to {:?}", path))?;

        // Set restrictive permissions (owner read/write only) to protect API keys
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&path)?.permissions();
            perms.set_mode(0o600); // rw-------
            std::fs::set_permissions(&path, perms)
                .with_context(|| "Failed to set config file permissions")?;
        }

        Ok(())
    }

    /// Model to use when none is given on the command line
    pub fn model(&self) -> String {
        self.default_model
            .clone()
            .unwrap_or_else(|| self.provider.default_model().to_string())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn context_options(&self) -> ContextOptions {
        ContextOptions {
            unsupported: self.unsupported_files,
            max_chars: self.max_context_chars,
        }
    }

    /// Credential sources in lookup order: secrets file, config file, environment
    pub fn credential_sources(&self) -> Result<Vec<CredentialSource>> {
        Ok(vec![
            CredentialSource::SecretsFile(Self::secrets_path()?),
            CredentialSource::Inline(self.api_keys.clone()),
            CredentialSource::Environment,
        ])
    }

    /// Store an API key for the given provider
    pub fn set_api_key(&mut self, provider: ProviderKind, key: String) {
        if let Some(name) = provider.adapter(None).credential_key() {
            self.api_keys.insert(name.to_string(), key);
        }
    }

    /// Check whether the current provider has a usable credential
    pub fn has_api_key(&self) -> bool {
        let adapter = self.provider.adapter(self.endpoint.as_deref());
        match adapter.credential_key() {
            Some(key) => self
                .credential_sources()
                .map(|sources| crate::credentials::resolve(key, &sources).is_some())
                .unwrap_or(false),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.provider, ProviderKind::OpenRouter);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.unsupported_files, UnsupportedPolicy::PlaceholderText);
        assert_eq!(config.max_context_chars, None);
        assert_eq!(config.model(), "meta-llama/llama-3.1-8b-instruct");
    }

    #[test]
    fn test_parse_full_config() {
        let config = Config::parse(
            r#"
            provider = "ollama"
            default_model = "llama3.2:3b"
            endpoint = "http://gpu-box:11434/api/chat"
            timeout_secs = 30
            unsupported_files = "decode-as-text"
            max_context_chars = 50000

            [api_keys]
            OPENROUTER_API_KEY = "sk-or-123"
            "#,
        )
        .unwrap();

        assert_eq!(config.provider, ProviderKind::Ollama);
        assert_eq!(config.model(), "llama3.2:3b");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.unsupported_files, UnsupportedPolicy::DecodeAsText);
        assert_eq!(config.context_options().max_chars, Some(50000));
        assert_eq!(config.api_keys["OPENROUTER_API_KEY"], "sk-or-123");
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        assert!(Config::parse(r#"endpoint = "not a url""#).is_err());
        assert!(Config::parse(r#"endpoint = "ftp://example.com/chat""#).is_err());
        assert!(Config::parse("timeout_secs = 0").is_err());
    }

    #[test]
    fn test_round_trip_through_toml() {
        let mut config = Config::default();
        config.set_api_key(ProviderKind::Groq, "gsk-1".to_string());
        config.set_api_key(ProviderKind::Ollama, "ignored".to_string());

        let text = toml::to_string_pretty(&config).unwrap();
        let parsed = Config::parse(&text).unwrap();
        assert_eq!(parsed.api_keys.len(), 1);
        assert_eq!(parsed.api_keys["GROQ_API_KEY"], "gsk-1");
    }

    #[test]
    fn test_credential_source_order() {
        let sources = Config::default().credential_sources().unwrap();
        assert!(matches!(sources[0], CredentialSource::SecretsFile(_)));
        assert!(matches!(sources[1], CredentialSource::Inline(_)));
        assert!(matches!(sources[2], CredentialSource::Environment));
    }
}

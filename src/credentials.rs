use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Where an API key may come from. Sources are tried in the order given.
#[derive(Debug, Clone)]
pub enum CredentialSource {
    /// A deployment secrets file of `KEY = "value"` TOML pairs
    SecretsFile(PathBuf),
    /// Keys already loaded into memory, such as the `[api_keys]` table of the config file
    Inline(BTreeMap<String, String>),
    /// The process environment
    Environment,
}

impl CredentialSource {
    fn lookup(&self, key: &str) -> Option<String> {
        match self {
            CredentialSource::SecretsFile(path) => read_secrets_file(path, key),
            CredentialSource::Inline(keys) => keys.get(key).cloned(),
            CredentialSource::Environment => std::env::var(key).ok(),
        }
    }

    /// Short description used in setup instructions
    pub fn describe(&self) -> String {
        match self {
            CredentialSource::SecretsFile(path) => format!("secrets file {}", path.display()),
            CredentialSource::Inline(_) => "config file".to_string(),
            CredentialSource::Environment => "environment".to_string(),
        }
    }
}

/// Resolve a credential by name from the first source that has a non-empty value
pub fn resolve(key: &str, sources: &[CredentialSource]) -> Option<String> {
    sources
        .iter()
        .filter_map(|source| source.lookup(key))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

fn read_secrets_file(path: &Path, key: &str) -> Option<String> {
    if !path.exists() {
        return None;
    }

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!("Could not read secrets file {:?}: {}", path, e);
            return None;
        }
    };

    let table: toml::Table = match toml::from_str(&content) {
        Ok(table) => table,
        Err(e) => {
            tracing::warn!("Could not parse secrets file {:?}: {}", path, e);
            return None;
        }
    };

    table.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn secrets_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_first_source_wins() {
        let file = secrets_file("DOCQA_TEST_KEY = \"from-secrets\"\n");
        let inline = BTreeMap::from([("DOCQA_TEST_KEY".to_string(), "from-config".to_string())]);

        let sources = vec![
            CredentialSource::SecretsFile(file.path().to_path_buf()),
            CredentialSource::Inline(inline),
        ];
        assert_eq!(
            resolve("DOCQA_TEST_KEY", &sources).as_deref(),
            Some("from-secrets")
        );
    }

    #[test]
    fn test_falls_through_missing_and_empty_values() {
        let file = secrets_file("OTHER_KEY = \"nope\"\n");
        let inline = BTreeMap::from([("DOCQA_TEST_KEY".to_string(), "   ".to_string())]);
        let fallback = BTreeMap::from([("DOCQA_TEST_KEY".to_string(), "fallback".to_string())]);

        let sources = vec![
            CredentialSource::SecretsFile(file.path().to_path_buf()),
            CredentialSource::SecretsFile(PathBuf::from("/nonexistent/docqa/secrets.toml")),
            CredentialSource::Inline(inline),
            CredentialSource::Inline(fallback),
        ];
        assert_eq!(resolve("DOCQA_TEST_KEY", &sources).as_deref(), Some("fallback"));
    }

    #[test]
    fn test_malformed_secrets_file_is_skipped() {
        let file = secrets_file("this is [not toml");
        let sources = vec![CredentialSource::SecretsFile(file.path().to_path_buf())];
        assert_eq!(resolve("DOCQA_TEST_KEY", &sources), None);
    }

    #[test]
    fn test_environment_source() {
        // PATH is always set for the test process
        let sources = vec![CredentialSource::Environment];
        assert!(resolve("PATH", &sources).is_some());
        assert_eq!(resolve("DOCQA_SURELY_UNSET_VARIABLE", &sources), None);
    }

    #[test]
    fn test_no_sources() {
        assert_eq!(resolve("DOCQA_TEST_KEY", &[]), None);
    }
}

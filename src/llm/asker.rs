use anyhow::{Context, Result};
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;

use super::{AskError, ChatProvider, ChatRequest};
use crate::credentials::{self, CredentialSource};

/// Sends one question at a time to a chat provider.
///
/// Holds no per-request state: every call resolves the credential again and
/// builds a fresh request, so identical inputs produce identical requests.
pub struct Asker {
    client: reqwest::Client,
    provider: Box<dyn ChatProvider>,
    credentials: Vec<CredentialSource>,
}

impl Asker {
    pub fn new(
        provider: Box<dyn ChatProvider>,
        credentials: Vec<CredentialSource>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            provider,
            credentials,
        })
    }

    pub fn provider(&self) -> &dyn ChatProvider {
        self.provider.as_ref()
    }

    /// The exact body that would be sent for these inputs
    pub fn request_body(&self, model: &str, question: &str, context: &str) -> Result<Vec<u8>, AskError> {
        self.provider
            .request_body(&ChatRequest::new(model, question, context))
    }

    /// Ask a question and return the answer, or an error string starting with `Error`
    pub async fn ask(&self, model: &str, question: &str, context: &str) -> String {
        match self.try_ask(model, question, context).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(provider = self.provider.name(), "Request failed: {}", e);
                e.render(self.provider.name())
            }
        }
    }

    /// Ask a question, keeping the failure kind
    pub async fn try_ask(&self, model: &str, question: &str, context: &str) -> Result<String, AskError> {
        let api_key = match self.provider.credential_key() {
            Some(key) => Some(
                credentials::resolve(key, &self.credentials)
                    .ok_or_else(|| self.missing_credential(key))?,
            ),
            None => None,
        };

        let body = self.request_body(model, question, context)?;

        tracing::debug!(
            provider = self.provider.name(),
            endpoint = self.provider.endpoint(),
            model,
            bytes = body.len(),
            "Sending chat request"
        );

        let mut request = self
            .client
            .post(self.provider.endpoint())
            .header(CONTENT_TYPE, "application/json")
            .body(body);

        if let Some(api_key) = &api_key {
            request = request.bearer_auth(api_key);
        }
        for (name, value) in self.provider.extra_headers() {
            request = request.header(name, value);
        }

        let response = request.send().await.map_err(AskError::Transport)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(AskError::Transport)?;

        if !status.is_success() {
            return Err(AskError::Status {
                status,
                body: String::from_utf8_lossy(&bytes).trim().to_string(),
            });
        }

        self.provider.parse_answer(&bytes)
    }

    fn missing_credential(&self, key: &str) -> AskError {
        let secrets = self
            .credentials
            .iter()
            .find(|source| matches!(source, CredentialSource::SecretsFile(_)))
            .map(CredentialSource::describe)
            .unwrap_or_else(|| "your secrets file".to_string());

        AskError::MissingCredential {
            provider: self.provider.name().to_string(),
            key: key.to_string(),
            secrets,
        }
    }
}

pub mod asker;
pub mod ollama;
pub mod openai;

#[cfg(test)]
pub(crate) mod test_server;

pub use asker::Asker;
pub use ollama::Ollama;
pub use openai::OpenAiCompatible;

use serde::{Deserialize, Serialize};

/// Fixed instruction sent as the first turn of every request
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant. Use the document context if it helps. \
If you don't know from the context, say you don't know.";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Provider-independent description of a single question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub model: String,
    pub system_message: String,
    pub user_message: String,
}

impl ChatRequest {
    /// Build the request for a question, inlining the document context when there is any
    pub fn new(model: &str, question: &str, context: &str) -> Self {
        let user_message = if context.trim().is_empty() {
            question.to_string()
        } else {
            format!("Context:\n{}\n\nQuestion: {}", context, question)
        };

        Self {
            model: model.to_string(),
            system_message: SYSTEM_PROMPT.to_string(),
            user_message,
        }
    }

    /// The two turns sent to the provider: system instruction, then the user message
    pub fn messages(&self) -> Vec<Message> {
        vec![
            Message::system(self.system_message.clone()),
            Message::user(self.user_message.clone()),
        ]
    }
}

/// Everything that can go wrong between a question and its answer
#[derive(Debug, thiserror::Error)]
pub enum AskError {
    #[error("No {provider} API key found.\n\nSet {key} in your environment, or add it to {secrets} as {key}.")]
    MissingCredential {
        provider: String,
        key: String,
        secrets: String,
    },
    #[error("{}", error_chain(.0))]
    Transport(reqwest::Error),
    #[error("HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("unexpected response: {0}")]
    Schema(String),
    #[error("could not encode request: {0}")]
    Encode(#[from] serde_json::Error),
}

impl AskError {
    /// Render the error as the plain string shown to the user
    pub fn render(&self, provider: &str) -> String {
        match self {
            AskError::MissingCredential { .. } => format!("Error: {}", self),
            _ => format!("Error calling {}: {}", provider, self),
        }
    }
}

/// reqwest keeps the useful part ("operation timed out", "connection refused") in the source chain
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !message.contains(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }
    message
}

/// One LLM provider: where to send a request, how to shape it and how to read the reply.
///
/// Implementations only describe the wire format; sending is done by [`Asker`].
pub trait ChatProvider: Send + Sync {
    /// Human readable provider name used in messages
    fn name(&self) -> &str;

    /// Chat endpoint URL
    fn endpoint(&self) -> &str;

    /// Name of the credential to look up, or `None` when the provider needs no key
    fn credential_key(&self) -> Option<&str>;

    /// Headers sent in addition to authorization and content type
    fn extra_headers(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    /// Serialize the request body
    fn request_body(&self, request: &ChatRequest) -> Result<Vec<u8>, AskError>;

    /// Pull the assistant reply out of a successful response body
    fn parse_answer(&self, body: &[u8]) -> Result<String, AskError>;
}

/// The providers this tool knows how to talk to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenRouter hosted models
    #[default]
    #[value(name = "openrouter")]
    OpenRouter,
    /// Groq hosted models
    Groq,
    /// A local Ollama server
    Ollama,
}

impl ProviderKind {
    pub const ALL: &'static [ProviderKind] =
        &[ProviderKind::OpenRouter, ProviderKind::Groq, ProviderKind::Ollama];

    /// Models offered for selection, with a short description
    pub fn models(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            ProviderKind::OpenRouter => &[
                ("meta-llama/llama-3.1-8b-instruct", "Llama 3.1 8B Instruct"),
                ("qwen/qwen-2.5-7b-instruct", "Qwen 2.5 7B Instruct"),
                ("mistralai/mistral-7b-instruct", "Mistral 7B Instruct"),
            ],
            ProviderKind::Groq => &[
                ("llama-3.3-70b-versatile", "Llama 3.3 70B - Best for complex tasks"),
                ("llama-3.1-8b-instant", "Llama 3.1 8B - Fast and efficient"),
                ("gemma2-9b-it", "Gemma 2 9B - Google's model"),
            ],
            ProviderKind::Ollama => &[
                ("llama3.2:1b", "Llama 3.2 1B - Small local model"),
                ("llama3.2:3b", "Llama 3.2 3B - Local model"),
            ],
        }
    }

    pub fn default_model(&self) -> &'static str {
        self.models()[0].0
    }

    /// Build the adapter for this provider, optionally pointing it at another endpoint
    pub fn adapter(&self, endpoint: Option<&str>) -> Box<dyn ChatProvider> {
        match self {
            ProviderKind::OpenRouter | ProviderKind::Groq => {
                let mut provider = if *self == ProviderKind::Groq {
                    OpenAiCompatible::groq()
                } else {
                    OpenAiCompatible::openrouter()
                };
                if let Some(endpoint) = endpoint {
                    provider = provider.with_endpoint(endpoint);
                }
                Box::new(provider)
            }
            ProviderKind::Ollama => Box::new(match endpoint {
                Some(endpoint) => Ollama::new(endpoint),
                None => Ollama::default(),
            }),
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::OpenRouter => write!(f, "openrouter"),
            ProviderKind::Groq => write!(f, "groq"),
            ProviderKind::Ollama => write!(f, "ollama"),
        }
    }
}

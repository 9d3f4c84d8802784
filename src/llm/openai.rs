use serde::{Deserialize, Serialize};

use super::{AskError, ChatProvider, ChatRequest, Message};

const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Value of the `X-Title` header OpenRouter uses to attribute requests
const CLIENT_TITLE: &str = "docqa";

/// Any provider speaking the OpenAI chat-completions format
#[derive(Debug, Clone)]
pub struct OpenAiCompatible {
    name: String,
    endpoint: String,
    credential_key: String,
    title: Option<String>,
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Option<Vec<Choice>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

impl OpenAiCompatible {
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        credential_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            credential_key: credential_key.into(),
            title: None,
            temperature: None,
        }
    }

    pub fn openrouter() -> Self {
        Self::new("OpenRouter", OPENROUTER_API_URL, "OPENROUTER_API_KEY")
            .with_title(CLIENT_TITLE)
            .with_temperature(0.2)
    }

    pub fn groq() -> Self {
        Self::new("Groq", GROQ_API_URL, "GROQ_API_KEY").with_temperature(0.2)
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

impl ChatProvider for OpenAiCompatible {
    fn name(&self) -> &str {
        &self.name
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn credential_key(&self) -> Option<&str> {
        Some(&self.credential_key)
    }

    fn extra_headers(&self) -> Vec<(&'static str, String)> {
        self.title
            .iter()
            .map(|title| ("X-Title", title.clone()))
            .collect()
    }

    fn request_body(&self, request: &ChatRequest) -> Result<Vec<u8>, AskError> {
        let body = CompletionRequest {
            model: &request.model,
            messages: request.messages(),
            temperature: self.temperature,
            stream: false,
        };
        Ok(serde_json::to_vec(&body)?)
    }

    fn parse_answer(&self, body: &[u8]) -> Result<String, AskError> {
        let response: CompletionResponse = serde_json::from_slice(body)
            .map_err(|e| AskError::Schema(format!("invalid JSON: {}", e)))?;

        let Some(choices) = response.choices else {
            return Err(AskError::Schema(match response.error {
                Some(error) => format!("provider error: {}", error.message),
                None => "missing choices".to_string(),
            }));
        };

        choices
            .into_iter()
            .next()
            .ok_or_else(|| AskError::Schema("no choices in response".to_string()))?
            .message
            .content
            .ok_or_else(|| AskError::Schema("missing message content".to_string()))
    }
}

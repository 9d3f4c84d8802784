use serde::{Deserialize, Serialize};

use super::{AskError, ChatProvider, ChatRequest, Message};

const OLLAMA_CHAT_URL: &str = "http://localhost:11434/api/chat";

/// A local Ollama server. No credential is needed.
#[derive(Debug, Clone)]
pub struct Ollama {
    endpoint: String,
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: Option<OllamaMessage>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    content: Option<String>,
}

impl Ollama {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

impl Default for Ollama {
    fn default() -> Self {
        Self::new(OLLAMA_CHAT_URL)
    }
}

impl ChatProvider for Ollama {
    fn name(&self) -> &str {
        "Ollama"
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn credential_key(&self) -> Option<&str> {
        None
    }

    fn request_body(&self, request: &ChatRequest) -> Result<Vec<u8>, AskError> {
        let body = OllamaChatRequest {
            model: &request.model,
            messages: request.messages(),
            stream: false,
        };
        Ok(serde_json::to_vec(&body)?)
    }

    fn parse_answer(&self, body: &[u8]) -> Result<String, AskError> {
        let response: OllamaChatResponse = serde_json::from_slice(body)
            .map_err(|e| AskError::Schema(format!("invalid JSON: {}", e)))?;

        if let Some(error) = response.error {
            return Err(AskError::Schema(format!("provider error: {}", error)));
        }

        response
            .message
            .and_then(|m| m.content)
            .ok_or_else(|| AskError::Schema("missing message content".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_disables_streaming() {
        let body: serde_json::Value = serde_json::from_slice(
            &Ollama::default()
                .request_body(&ChatRequest::new("llama3.2:1b", "Q?", ""))
                .unwrap(),
        )
        .unwrap();

        assert_eq!(body["model"], "llama3.2:1b");
        assert_eq!(body["stream"], false);
        assert_eq!(body["messages"][1]["content"], "Q?");
        assert!(body.get("temperature").is_none());
    }

    #[test]
    fn test_parse_answer() {
        let body = br#"{"model":"llama3.2:1b","message":{"role":"assistant","content":"Hi"},"done":true}"#;
        assert_eq!(Ollama::default().parse_answer(body).unwrap(), "Hi");
    }

    #[test]
    fn test_parse_answer_missing_message() {
        let err = Ollama::default().parse_answer(br#"{"done":true}"#).unwrap_err();
        assert!(matches!(err, AskError::Schema(_)));

        let err = Ollama::default()
            .parse_answer(br#"{"error":"model 'x' not found"}"#)
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}

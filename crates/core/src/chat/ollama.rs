use crate::chat::{ChatError, ChatMessage, ChatModel};
use crate::config::ModelName;
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

/// Chat client for a local Ollama server (`POST /api/chat`, non-streaming).
#[derive(Clone)]
pub struct OllamaChatClient {
    client: Client,
    base_url: Url,
    model: ModelName,
}

impl OllamaChatClient {
    pub fn new(base_url: Url, model: ModelName) -> Self {
        Self {
            client: Client::new(),
            base_url,
            model,
        }
    }

    pub fn model(&self) -> &ModelName {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/api/chat", self.base_url.as_str().trim_end_matches('/'))
    }
}

#[derive(Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: Option<OllamaMessage>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct OllamaMessage {
    content: String,
}

fn parse_chat_body(body: &str) -> Result<String, ChatError> {
    let parsed: OllamaChatResponse = serde_json::from_str(body)
        .map_err(|e| ChatError::InvalidResponse(format!("Failed to parse JSON: {e}")))?;

    if let Some(err) = parsed.error {
        return Err(ChatError::InvalidResponse(err));
    }

    parsed
        .message
        .map(|m| m.content)
        .ok_or_else(|| ChatError::InvalidResponse("No message in response".to_owned()))
}

impl ChatModel for OllamaChatClient {
    fn complete(&self, messages: Vec<ChatMessage>) -> BoxFuture<'_, Result<String, ChatError>> {
        async move {
            let request = OllamaChatRequest {
                model: self.model.as_str(),
                messages: &messages,
                stream: false,
            };

            tracing::debug!(model = %self.model.as_str(), turns = messages.len(), "sending chat request");

            let response = self
                .client
                .post(self.endpoint())
                .json(&request)
                .send()
                .await
                .map_err(|e| {
                    tracing::error!("Ollama request failed: {}", e);
                    ChatError::Http(e)
                })?;

            let status = response.status();
            let body = response.text().await.map_err(ChatError::Http)?;

            if !status.is_success() {
                tracing::error!("Ollama error {}: {}", status, body);
                return Err(ChatError::HttpStatus(status.as_u16(), body));
            }

            parse_chat_body(&body)
        }
        .boxed()
    }
}

mod ollama;

use crate::config::DEFAULT_SYSTEM_PROMPT;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

pub use ollama::OllamaChatClient;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ChatError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("http error {0}: {1}")]
    HttpStatus(u16, String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

pub trait ChatModel: Send + Sync {
    fn complete(&self, messages: Vec<ChatMessage>) -> BoxFuture<'_, Result<String, ChatError>>;
}

/// Turns one user prompt into one model reply. Stateless: no earlier turns are sent.
pub struct ResponseGenerator<C> {
    model: C,
    system_prompt: String,
}

impl<C: ChatModel> ResponseGenerator<C> {
    pub fn new(model: C) -> Self {
        Self {
            model,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_owned(),
        }
    }

    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub async fn try_generate(&self, prompt: &str) -> Result<String, ChatError> {
        let messages = vec![
            ChatMessage::system(self.system_prompt.as_str()),
            ChatMessage::user(prompt),
        ];
        let reply = self.model.complete(messages).await?;
        Ok(reply.trim().to_owned())
    }

    /// Never fails: errors come back as `"An error occurred: <details>"`.
    pub async fn generate(&self, prompt: &str) -> String {
        match self.try_generate(prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(error = %e, "chat completion failed");
                format!("An error occurred: {e}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingModel {
        seen: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
    }

    impl ChatModel for RecordingModel {
        fn complete(
            &self,
            messages: Vec<ChatMessage>,
        ) -> BoxFuture<'_, Result<String, ChatError>> {
            self.seen.lock().unwrap().push(messages);
            async { Ok("  I'm here for you.\n".to_owned()) }.boxed()
        }
    }

    struct DownModel;

    impl ChatModel for DownModel {
        fn complete(
            &self,
            _messages: Vec<ChatMessage>,
        ) -> BoxFuture<'_, Result<String, ChatError>> {
            async { Err(ChatError::HttpStatus(503, "model is loading".into())) }.boxed()
        }
    }

    #[tokio::test]
    async fn sends_system_and_user_turns_only() {
        let model = RecordingModel::default();
        let generator = ResponseGenerator::new(model.clone());

        let reply = generator.generate("I had a rough day").await;
        assert_eq!(reply, "I'm here for you.");

        generator.generate("second message").await;
        let seen = model.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(
            seen[1],
            vec![
                ChatMessage::system("You are a helpful assistant."),
                ChatMessage::user("second message"),
            ]
        );
    }

    #[tokio::test]
    async fn failure_becomes_displayable_text() {
        let generator = ResponseGenerator::new(DownModel);
        let reply = generator.generate("hello").await;
        assert!(reply.starts_with("An error occurred:"), "{reply}");
        assert!(reply.contains("503"));
        assert!(generator.try_generate("hello").await.is_err());
    }

    #[tokio::test]
    async fn custom_system_prompt_is_used() {
        let model = RecordingModel::default();
        let generator = ResponseGenerator::new(model.clone()).with_system_prompt("Be brief.");
        generator.generate("hi").await;
        let seen = model.seen.lock().unwrap();
        assert_eq!(seen[0][0], ChatMessage::system("Be brief."));
    }

    #[test]
    fn roles_serialize_lowercase() {
        let json = serde_json::to_string(&ChatMessage::user("hi")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);
    }
}

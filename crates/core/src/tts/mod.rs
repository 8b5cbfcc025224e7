mod google;

use crate::config::LangCode;
use bytes::Bytes;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use google::GoogleTtsClient;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TtsRequest {
    pub text: String,
    pub lang: LangCode,
}

/// Encoded MP3 audio as returned by the service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TtsAudio {
    pub mp3: Bytes,
}

#[derive(thiserror::Error, Debug)]
pub enum TtsError {
    #[error("no text to speak")]
    EmptyText,

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("http error {0}: {1}")]
    HttpStatus(u16, String),

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub trait TtsClient: Send + Sync {
    fn synthesize(&self, request: TtsRequest) -> BoxFuture<'_, Result<TtsAudio, TtsError>>;
}

/// Writes synthesized speech to one fixed file, replacing it on every call.
pub struct SpeechSynthesizer<T> {
    client: T,
    lang: LangCode,
    output_path: PathBuf,
}

impl<T: TtsClient> SpeechSynthesizer<T> {
    pub fn new(client: T, lang: LangCode, output_path: PathBuf) -> Self {
        Self {
            client,
            lang,
            output_path,
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub async fn synthesize(&self, text: &str) -> Result<PathBuf, TtsError> {
        let audio = self
            .client
            .synthesize(TtsRequest {
                text: text.to_owned(),
                lang: self.lang.clone(),
            })
            .await?;

        tokio::fs::write(&self.output_path, &audio.mp3)
            .await
            .map_err(|source| TtsError::Write {
                path: self.output_path.clone(),
                source,
            })?;

        tracing::info!(
            path = %self.output_path.display(),
            bytes = audio.mp3.len(),
            "speech written"
        );
        Ok(self.output_path.clone())
    }
}

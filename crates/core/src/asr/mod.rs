mod microphone;
mod whisper;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use microphone::{DetectorStep, MicrophoneCapture, PhraseDetector, PhraseSettings};
pub use whisper::WhisperRecognizer;

/// One captured phrase, downmixed to mono.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CapturedAudio {
    pub sample_rate: u32,
    pub samples: Vec<f32>,
}

impl CapturedAudio {
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / f64::from(self.sample_rate))
    }
}

#[derive(thiserror::Error, Debug)]
pub enum CaptureError {
    #[error("listening timed out while waiting for phrase to start")]
    WaitTimeout,

    #[error("no audio input device available")]
    NoInputDevice,

    #[error("unsupported input sample format: {0}")]
    UnsupportedFormat(String),

    #[error("audio input error: {0}")]
    Device(String),
}

#[derive(thiserror::Error, Debug)]
pub enum RecognizeError {
    #[error("speech was not recognized")]
    Unintelligible,

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("http error {0}: {1}")]
    HttpStatus(u16, String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("wav encoding failed: {0}")]
    Encode(#[from] hound::Error),
}

/// The three ways listening can fail. None of them ends the session.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ListenError {
    #[error("speech could not be understood")]
    Unintelligible,

    #[error("speech service error: {0}")]
    Service(String),

    #[error("{0}")]
    Other(String),
}

impl ListenError {
    pub fn user_message(&self) -> String {
        match self {
            ListenError::Unintelligible => "Sorry, I could not understand your speech.".to_owned(),
            ListenError::Service(_) => "Speech service error.".to_owned(),
            ListenError::Other(details) => format!("Error: {details}"),
        }
    }
}

impl From<CaptureError> for ListenError {
    fn from(e: CaptureError) -> Self {
        ListenError::Other(e.to_string())
    }
}

impl From<RecognizeError> for ListenError {
    fn from(e: RecognizeError) -> Self {
        match e {
            RecognizeError::Unintelligible => ListenError::Unintelligible,
            RecognizeError::Encode(_) => ListenError::Other(e.to_string()),
            RecognizeError::Http(_)
            | RecognizeError::HttpStatus(..)
            | RecognizeError::InvalidResponse(_) => ListenError::Service(e.to_string()),
        }
    }
}

pub trait AudioCapture: Send + Sync {
    /// Waits up to `timeout` for a phrase to start, then records it.
    fn capture(&self, timeout: Duration) -> BoxFuture<'_, Result<CapturedAudio, CaptureError>>;
}

pub trait SpeechRecognizer: Send + Sync {
    fn recognize(&self, audio: CapturedAudio) -> BoxFuture<'_, Result<String, RecognizeError>>;
}

pub trait Listener: Send + Sync {
    fn listen(&self, timeout: Duration) -> BoxFuture<'_, Result<String, ListenError>>;
}

/// Microphone capture followed by a transcription call.
pub struct SpeechListener<A, R> {
    capture: A,
    recognizer: R,
}

impl<A, R> SpeechListener<A, R>
where
    A: AudioCapture,
    R: SpeechRecognizer,
{
    pub fn new(capture: A, recognizer: R) -> Self {
        Self {
            capture,
            recognizer,
        }
    }
}

impl<A, R> Listener for SpeechListener<A, R>
where
    A: AudioCapture,
    R: SpeechRecognizer,
{
    fn listen(&self, timeout: Duration) -> BoxFuture<'_, Result<String, ListenError>> {
        async move {
            tracing::info!(timeout_secs = timeout.as_secs_f32(), "listening");
            let audio = self.capture.capture(timeout).await.map_err(|e| {
                tracing::warn!(error = %e, "capture failed");
                ListenError::from(e)
            })?;

            tracing::debug!(
                seconds = audio.duration().as_secs_f32(),
                sample_rate = audio.sample_rate,
                "phrase captured"
            );

            let text = self.recognizer.recognize(audio).await.map_err(|e| {
                tracing::warn!(error = %e, "recognition failed");
                ListenError::from(e)
            })?;
            Ok(text)
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedCapture(Option<CapturedAudio>);

    impl AudioCapture for FixedCapture {
        fn capture(
            &self,
            _timeout: Duration,
        ) -> BoxFuture<'_, Result<CapturedAudio, CaptureError>> {
            let audio = self.0.clone();
            async move { audio.ok_or(CaptureError::WaitTimeout) }.boxed()
        }
    }

    enum Recognized {
        Text(&'static str),
        Nothing,
        ServiceDown,
    }

    impl SpeechRecognizer for Recognized {
        fn recognize(
            &self,
            _audio: CapturedAudio,
        ) -> BoxFuture<'_, Result<String, RecognizeError>> {
            let result = match self {
                Recognized::Text(t) => Ok((*t).to_owned()),
                Recognized::Nothing => Err(RecognizeError::Unintelligible),
                Recognized::ServiceDown => {
                    Err(RecognizeError::HttpStatus(500, "whisper crashed".into()))
                }
            };
            async move { result }.boxed()
        }
    }

    fn one_second() -> Option<CapturedAudio> {
        Some(CapturedAudio {
            sample_rate: 16_000,
            samples: vec![0.1; 16_000],
        })
    }

    #[tokio::test]
    async fn transcript_is_returned() {
        let listener = SpeechListener::new(FixedCapture(one_second()), Recognized::Text("hello"));
        assert_eq!(listener.listen(Duration::from_secs(5)).await, Ok("hello".to_owned()));
    }

    #[tokio::test]
    async fn each_failure_kind_is_distinct() {
        let unintelligible = SpeechListener::new(FixedCapture(one_second()), Recognized::Nothing)
            .listen(Duration::from_secs(5))
            .await
            .unwrap_err();
        let service = SpeechListener::new(FixedCapture(one_second()), Recognized::ServiceDown)
            .listen(Duration::from_secs(5))
            .await
            .unwrap_err();
        let timeout = SpeechListener::new(FixedCapture(None), Recognized::Text("unused"))
            .listen(Duration::from_secs(5))
            .await
            .unwrap_err();

        assert_eq!(unintelligible, ListenError::Unintelligible);
        assert!(matches!(service, ListenError::Service(_)));
        assert!(matches!(timeout, ListenError::Other(_)));

        let messages = [
            unintelligible.user_message(),
            service.user_message(),
            timeout.user_message(),
        ];
        assert_eq!(messages[0], "Sorry, I could not understand your speech.");
        assert_eq!(messages[1], "Speech service error.");
        assert_eq!(
            messages[2],
            "Error: listening timed out while waiting for phrase to start"
        );
    }

    #[test]
    fn captured_audio_duration() {
        assert_eq!(one_second().unwrap().duration(), Duration::from_secs(1));
        let silent = CapturedAudio {
            sample_rate: 0,
            samples: vec![0.0; 10],
        };
        assert_eq!(silent.duration(), Duration::ZERO);
    }
}

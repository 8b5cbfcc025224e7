use crate::asr::{CapturedAudio, RecognizeError, SpeechRecognizer};
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::{multipart, Client};
use serde::Deserialize;
use std::io::Cursor;
use url::Url;

/// Speech-to-text over a whisper transcription server that takes a
/// multipart `file` upload and answers `{"text": ...}`.
#[derive(Clone)]
pub struct WhisperRecognizer {
    client: Client,
    endpoint: Url,
}

impl WhisperRecognizer {
    pub fn new(endpoint: Url) -> Self {
        Self {
            client: Client::new(),
            endpoint,
        }
    }
}

#[derive(Deserialize)]
struct WhisperResponse {
    text: String,
}

fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16
}

/// 16-bit mono PCM WAV.
pub(crate) fn encode_wav(audio: &CapturedAudio) -> Result<Vec<u8>, hound::Error> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: audio.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for sample in &audio.samples {
            writer.write_sample(to_i16(*sample))?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

fn parse_transcript(body: &str) -> Result<String, RecognizeError> {
    let parsed: WhisperResponse = serde_json::from_str(body)
        .map_err(|e| RecognizeError::InvalidResponse(format!("Failed to parse JSON: {e}")))?;
    let text = parsed.text.trim();
    if text.is_empty() {
        return Err(RecognizeError::Unintelligible);
    }
    Ok(text.to_owned())
}

impl SpeechRecognizer for WhisperRecognizer {
    fn recognize(&self, audio: CapturedAudio) -> BoxFuture<'_, Result<String, RecognizeError>> {
        async move {
            let wav = encode_wav(&audio)?;
            tracing::debug!(bytes = wav.len(), endpoint = %self.endpoint, "uploading speech");

            let part = multipart::Part::bytes(wav)
                .file_name("speech.wav")
                .mime_str("audio/wav")?;
            let form = multipart::Form::new().part("file", part);

            let response = self
                .client
                .post(self.endpoint.clone())
                .multipart(form)
                .send()
                .await?;

            let status = response.status();
            let body = response.text().await?;
            if !status.is_success() {
                tracing::error!("whisper error {}: {}", status, body);
                return Err(RecognizeError::HttpStatus(status.as_u16(), body));
            }

            let text = parse_transcript(&body)?;
            tracing::info!(chars = text.chars().count(), "speech transcribed");
            Ok(text)
        }
        .boxed()
    }
}

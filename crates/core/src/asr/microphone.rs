use crate::asr::{AudioCapture, CaptureError, CapturedAudio};
use futures::future::BoxFuture;
use futures::FutureExt;
use rodio::cpal;
use rodio::cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rodio::cpal::SampleFormat;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Clone, Debug, PartialEq)]
pub struct PhraseSettings {
    /// RMS level (full scale = 1.0) that counts as speech.
    pub energy_threshold: f32,
    /// Trailing silence that ends a phrase.
    pub pause: Duration,
    /// Hard cap on phrase length.
    pub phrase_limit: Duration,
}

impl Default for PhraseSettings {
    fn default() -> Self {
        Self {
            energy_threshold: 0.01,
            pause: Duration::from_millis(800),
            phrase_limit: Duration::from_secs(30),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetectorStep {
    Waiting,
    Recording,
    Complete,
    TimedOut,
}

/// Energy-based phrase boundary detection over a stream of mono blocks.
#[derive(Debug)]
pub struct PhraseDetector {
    settings: PhraseSettings,
    timeout: Duration,
    waited: Duration,
    recording: bool,
    silence: Duration,
    recorded: Duration,
    samples: Vec<f32>,
}

impl PhraseDetector {
    pub fn new(settings: PhraseSettings, timeout: Duration) -> Self {
        Self {
            settings,
            timeout,
            waited: Duration::ZERO,
            recording: false,
            silence: Duration::ZERO,
            recorded: Duration::ZERO,
            samples: Vec::new(),
        }
    }

    /// Feeds one block covering `elapsed` of wall time. An empty block
    /// advances the clock only.
    pub fn push(&mut self, block: &[f32], elapsed: Duration) -> DetectorStep {
        let loud = rms(block) >= self.settings.energy_threshold;

        if !self.recording {
            if loud {
                self.recording = true;
                self.samples.extend_from_slice(block);
                self.recorded = elapsed;
                return DetectorStep::Recording;
            }
            self.waited += elapsed;
            if self.waited >= self.timeout {
                return DetectorStep::TimedOut;
            }
            return DetectorStep::Waiting;
        }

        self.samples.extend_from_slice(block);
        self.recorded += elapsed;
        if loud {
            self.silence = Duration::ZERO;
        } else {
            self.silence += elapsed;
        }

        if self.silence >= self.settings.pause || self.recorded >= self.settings.phrase_limit {
            DetectorStep::Complete
        } else {
            DetectorStep::Recording
        }
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }
}

fn rms(block: &[f32]) -> f32 {
    if block.is_empty() {
        return 0.0;
    }
    let sum: f32 = block.iter().map(|s| s * s).sum();
    (sum / block.len() as f32).sqrt()
}

fn downmix(samples: impl Iterator<Item = f32>, channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.collect();
    }
    let interleaved: Vec<f32> = samples.collect();
    interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

fn log_stream_error(err: cpal::StreamError) {
    tracing::warn!(error = %err, "audio input stream error");
}

/// Records one phrase from the default input device.
#[derive(Clone, Debug, Default)]
pub struct MicrophoneCapture {
    settings: PhraseSettings,
}

impl MicrophoneCapture {
    pub fn new(settings: PhraseSettings) -> Self {
        Self { settings }
    }
}

impl AudioCapture for MicrophoneCapture {
    fn capture(&self, timeout: Duration) -> BoxFuture<'_, Result<CapturedAudio, CaptureError>> {
        let settings = self.settings.clone();
        async move {
            // cpal streams are not Send; the whole recording lives on one blocking thread.
            tokio::task::spawn_blocking(move || record_phrase(settings, timeout))
                .await
                .map_err(|e| CaptureError::Device(format!("capture task failed: {e}")))?
        }
        .boxed()
    }
}

fn record_phrase(settings: PhraseSettings, timeout: Duration) -> Result<CapturedAudio, CaptureError> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or(CaptureError::NoInputDevice)?;
    let supported = device
        .default_input_config()
        .map_err(|e| CaptureError::Device(e.to_string()))?;

    let sample_rate = supported.sample_rate().0;
    if sample_rate == 0 {
        return Err(CaptureError::Device("input device reports 0 Hz".to_owned()));
    }
    let channels = usize::from(supported.channels());
    let config = supported.config();
    let (tx, rx) = mpsc::channel::<Vec<f32>>();

    tracing::debug!(
        device = %device.name().unwrap_or_else(|_| "<unnamed>".to_owned()),
        sample_rate,
        channels,
        "opening input stream"
    );

    let stream = match supported.sample_format() {
        SampleFormat::F32 => device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let _ = tx.send(downmix(data.iter().copied(), channels));
            },
            log_stream_error,
            None,
        ),
        SampleFormat::I16 => device.build_input_stream(
            &config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                let block = data.iter().map(|s| f32::from(*s) / f32::from(i16::MAX));
                let _ = tx.send(downmix(block, channels));
            },
            log_stream_error,
            None,
        ),
        other => return Err(CaptureError::UnsupportedFormat(format!("{other:?}"))),
    }
    .map_err(|e| CaptureError::Device(e.to_string()))?;

    stream
        .play()
        .map_err(|e| CaptureError::Device(e.to_string()))?;

    let mut detector = PhraseDetector::new(settings, timeout);
    loop {
        let step = match rx.recv_timeout(POLL_INTERVAL) {
            Ok(block) => {
                let elapsed = Duration::from_secs_f64(block.len() as f64 / f64::from(sample_rate));
                detector.push(&block, elapsed)
            }
            Err(RecvTimeoutError::Timeout) => detector.push(&[], POLL_INTERVAL),
            Err(RecvTimeoutError::Disconnected) => {
                return Err(CaptureError::Device("input stream closed".to_owned()));
            }
        };

        match step {
            DetectorStep::Complete => break,
            DetectorStep::TimedOut => return Err(CaptureError::WaitTimeout),
            DetectorStep::Waiting | DetectorStep::Recording => {}
        }
    }
    drop(stream);

    Ok(CapturedAudio {
        sample_rate,
        samples: detector.into_samples(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOCK: Duration = Duration::from_millis(100);

    fn settings() -> PhraseSettings {
        PhraseSettings {
            energy_threshold: 0.1,
            pause: Duration::from_millis(300),
            phrase_limit: Duration::from_secs(2),
        }
    }

    #[test]
    fn silence_until_timeout_times_out() {
        let mut d = PhraseDetector::new(settings(), Duration::from_millis(500));
        for _ in 0..4 {
            assert_eq!(d.push(&[0.0; 8], BLOCK), DetectorStep::Waiting);
        }
        assert_eq!(d.push(&[0.0; 8], BLOCK), DetectorStep::TimedOut);
    }

    #[test]
    fn phrase_ends_after_trailing_pause() {
        let mut d = PhraseDetector::new(settings(), Duration::from_secs(5));
        assert_eq!(d.push(&[0.0; 4], BLOCK), DetectorStep::Waiting);
        assert_eq!(d.push(&[0.5; 4], BLOCK), DetectorStep::Recording);
        assert_eq!(d.push(&[0.5; 4], BLOCK), DetectorStep::Recording);
        assert_eq!(d.push(&[0.0; 4], BLOCK), DetectorStep::Recording);
        assert_eq!(d.push(&[0.0; 4], BLOCK), DetectorStep::Recording);
        assert_eq!(d.push(&[0.0; 4], BLOCK), DetectorStep::Complete);
        // leading silence is dropped, trailing silence kept
        assert_eq!(d.into_samples().len(), 20);
    }

    #[test]
    fn speech_resets_the_pause_clock() {
        let mut d = PhraseDetector::new(settings(), Duration::from_secs(5));
        d.push(&[0.5; 4], BLOCK);
        d.push(&[0.0; 4], BLOCK);
        d.push(&[0.0; 4], BLOCK);
        assert_eq!(d.push(&[0.5; 4], BLOCK), DetectorStep::Recording);
        d.push(&[0.0; 4], BLOCK);
        assert_eq!(d.push(&[0.0; 4], BLOCK), DetectorStep::Recording);
    }

    #[test]
    fn phrase_limit_caps_recording() {
        let mut d = PhraseDetector::new(settings(), Duration::from_secs(5));
        let mut steps = Vec::new();
        for _ in 0..20 {
            steps.push(d.push(&[0.9; 2], BLOCK));
        }
        assert_eq!(steps.iter().position(|s| *s == DetectorStep::Complete), Some(19));
    }

    #[test]
    fn empty_blocks_only_advance_time() {
        let mut d = PhraseDetector::new(settings(), Duration::from_millis(200));
        assert_eq!(d.push(&[], BLOCK), DetectorStep::Waiting);
        assert_eq!(d.push(&[], BLOCK), DetectorStep::TimedOut);
        assert!(d.into_samples().is_empty());
    }

    #[test]
    fn stereo_is_averaged_to_mono() {
        let mono = downmix([1.0, 0.0, 0.5, 0.5].into_iter(), 2);
        assert_eq!(mono, vec![0.5, 0.5]);
        assert_eq!(downmix([0.25].into_iter(), 1), vec![0.25]);
    }

    #[test]
    fn rms_of_constant_block() {
        assert!((rms(&[0.5; 16]) - 0.5).abs() < 1e-6);
        assert_eq!(rms(&[]), 0.0);
    }
}

use crate::playback::{PlaybackError, PlaybackSink};
use futures::future::BoxFuture;
use futures::FutureExt;
use rodio::cpal::traits::{DeviceTrait, HostTrait};
use rodio::cpal::BuildStreamError;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, StreamError};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct OutputState {
    stream: Option<OutputStream>,
    /// Set once no output device exists; later clips fail fast with this.
    missing_device: Option<String>,
}

/// Plays encoded audio files (MP3, WAV) through rodio.
///
/// The output stream is opened on first use and kept for the life of the
/// sink: dropping it stops whatever is playing.
#[derive(Clone, Default)]
pub struct AudioPlaybackSink {
    output_device_name: Option<String>,
    output: Arc<Mutex<OutputState>>,
}

impl AudioPlaybackSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefers the output device with this name (case and surrounding
    /// whitespace ignored), falling back to the default device.
    pub fn with_output_device_name<S: Into<String>>(mut self, name: S) -> Self {
        self.output_device_name = Some(name.into());
        self
    }

    fn output(&self) -> MutexGuard<'_, OutputState> {
        match self.output.lock() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("playback output lock was poisoned; recovering");
                poisoned.into_inner()
            }
        }
    }

    fn missing_device(&self) -> Option<String> {
        self.output().missing_device.clone()
    }

    fn connect_sink(&self) -> Result<Sink, PlaybackError> {
        let mut output = self.output();

        if output.stream.is_none() {
            match open_stream(self.output_device_name.as_deref()) {
                Ok(stream) => output.stream = Some(stream),
                Err(failure) => {
                    if failure.missing_device {
                        output.missing_device = Some(failure.details.clone());
                    }
                    return Err(PlaybackError::AudioOutputUnavailable {
                        details: failure.details,
                    });
                }
            }
        }

        match output.stream.as_ref() {
            Some(stream) => Ok(Sink::connect_new(stream.mixer())),
            None => Err(PlaybackError::AudioOutputUnavailable {
                details: "output stream missing after open".to_owned(),
            }),
        }
    }
}

fn open_decoder(path: &Path) -> Result<Decoder<BufReader<File>>, PlaybackError> {
    let file = File::open(path).map_err(|source| PlaybackError::Open {
        path: path.to_owned(),
        source,
    })?;
    Decoder::new(BufReader::new(file)).map_err(|e| PlaybackError::Decode {
        path: path.to_owned(),
        details: e.to_string(),
    })
}

impl PlaybackSink for AudioPlaybackSink {
    fn play(&self, path: PathBuf) -> BoxFuture<'_, Result<(), PlaybackError>> {
        async move {
            if let Some(details) = self.missing_device() {
                tracing::debug!(path = %path.display(), "no output device; not playing");
                return Err(PlaybackError::AudioOutputUnavailable { details });
            }

            // A bad file is reported without touching the device.
            let source = open_decoder(&path)?;
            let sink = self.connect_sink()?;

            tracing::info!(path = %path.display(), "playing audio");
            sink.append(source);
            sink.sleep_until_end();
            Ok(())
        }
        .boxed()
    }
}

struct OpenFailure {
    details: String,
    missing_device: bool,
}

fn is_missing_device(err: &StreamError) -> bool {
    matches!(
        err,
        StreamError::NoDevice | StreamError::BuildStreamError(BuildStreamError::DeviceNotAvailable)
    )
}

fn same_device_name(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

fn open_stream(wanted: Option<&str>) -> Result<OutputStream, OpenFailure> {
    if let Some(wanted) = wanted {
        match open_named_stream(wanted) {
            Ok(stream) => return Ok(stream),
            Err(reason) => {
                tracing::warn!(wanted_device = %wanted, %reason, "using the default output device");
            }
        }
    }

    OutputStreamBuilder::open_default_stream().map_err(|err| OpenFailure {
        missing_device: is_missing_device(&err),
        details: match wanted {
            Some(w) => format!("default output device (after {w:?}): {err}"),
            None => format!("default output device: {err}"),
        },
    })
}

fn open_named_stream(wanted: &str) -> Result<OutputStream, String> {
    let host = rodio::cpal::default_host();
    let devices = host.output_devices().map_err(|e| e.to_string())?;

    let mut names = Vec::new();
    let mut found = None;
    for device in devices {
        let name = device.name().unwrap_or_else(|_| "<unnamed>".to_owned());
        if found.is_none() && same_device_name(&name, wanted) {
            found = Some(device);
        }
        names.push(name);
    }

    let Some(device) = found else {
        let available = if names.is_empty() {
            "none".to_owned()
        } else {
            names.join(", ")
        };
        return Err(format!("no output device named {wanted:?} (available: {available})"));
    };

    OutputStreamBuilder::from_device(device)
        .and_then(|b| b.open_stream_or_fallback())
        .map_err(|e| e.to_string())
}

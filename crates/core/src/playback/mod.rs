mod audio;
mod dummy;

use futures::future::BoxFuture;
use std::path::PathBuf;

pub use audio::AudioPlaybackSink;
pub use dummy::DummyPlaybackSink;

#[derive(thiserror::Error, Debug)]
pub enum PlaybackError {
    #[error("audio output unavailable: {details}")]
    AudioOutputUnavailable { details: String },

    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot decode {}: {details}", path.display())]
    Decode { path: PathBuf, details: String },
}

pub trait PlaybackSink: Send + Sync {
    /// Plays an audio file to completion.
    fn play(&self, path: PathBuf) -> BoxFuture<'_, Result<(), PlaybackError>>;
}

impl<T: PlaybackSink + ?Sized> PlaybackSink for Box<T> {
    fn play(&self, path: PathBuf) -> BoxFuture<'_, Result<(), PlaybackError>> {
        (**self).play(path)
    }
}

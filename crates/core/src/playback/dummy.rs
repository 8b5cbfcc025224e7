use crate::playback::{PlaybackError, PlaybackSink};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Silent sink: remembers the last file it was asked to play.
#[derive(Clone, Default)]
pub struct DummyPlaybackSink {
    last: Arc<Mutex<Option<PathBuf>>>,
}

impl DummyPlaybackSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_played(&self) -> Option<PathBuf> {
        match self.last.lock() {
            Ok(g) => g.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl PlaybackSink for DummyPlaybackSink {
    fn play(&self, path: PathBuf) -> BoxFuture<'_, Result<(), PlaybackError>> {
        async move {
            tracing::debug!(path = %path.display(), "playback muted");
            match self.last.lock() {
                Ok(mut g) => *g = Some(path),
                Err(poisoned) => *poisoned.into_inner() = Some(path),
            }
            Ok(())
        }
        .boxed()
    }
}

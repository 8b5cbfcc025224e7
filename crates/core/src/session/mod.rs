//! One conversation: typed or spoken input in, classified mood, coping
//! suggestion and model reply out.
//!
//! [`Therapist`] owns the whole [`SessionState`]. Every user action is a single
//! `&mut self` call, so transitions never overlap.

mod summary;

use crate::asr::{ListenError, Listener};
use crate::chat::{ChatModel, ResponseGenerator};
use crate::config::ListenTimeout;
use crate::coping;
use crate::playback::PlaybackSink;
use crate::sentiment::{Category, SentimentAnalyzer};
use crate::tts::{SpeechSynthesizer, TtsClient};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

pub use summary::MoodSummary;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Sender {
    User,
    Therapist,
}

impl Sender {
    pub fn label(&self) -> &'static str {
        match self {
            Sender::User => "You",
            Sender::Therapist => "Therapist",
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub sender: Sender,
    pub text: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MoodEntry {
    pub message: String,
    pub category: Category,
    pub polarity: f64,
}

/// Last user action.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    AwaitingSpeech,
    Submitted,
    PlaybackRequested,
    SummaryRequested,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Submit(String),
    Speak,
    Play,
    Summary,
}

/// Result of one completed submission.
#[derive(Clone, Debug, PartialEq)]
pub struct Exchange {
    pub user: String,
    pub reply: String,
    pub category: Category,
    pub polarity: f64,
    pub coping: &'static str,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// Blank submission; nothing changed.
    Ignored,
    Replied(Exchange),
    Transcribed(String),
    ListenFailed(ListenError),
    NothingToPlay,
    Played(PathBuf),
    PlaybackFailed(String),
    Summary(MoodSummary),
}

#[derive(Clone, Debug, Default)]
pub struct SessionState {
    messages: Vec<Message>,
    mood_history: Vec<MoodEntry>,
    transcribed_text: String,
    last_response: Option<String>,
    coping_strategy: Option<&'static str>,
    phase: Phase,
}

impl SessionState {
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn mood_history(&self) -> &[MoodEntry] {
        &self.mood_history
    }

    pub fn transcribed_text(&self) -> &str {
        &self.transcribed_text
    }

    pub fn last_response(&self) -> Option<&str> {
        self.last_response.as_deref()
    }

    pub fn coping_strategy(&self) -> Option<&'static str> {
        self.coping_strategy
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }
}

pub struct Therapist<S, C, T, L, P> {
    analyzer: S,
    responder: ResponseGenerator<C>,
    synthesizer: SpeechSynthesizer<T>,
    listener: L,
    playback: P,
    listen_timeout: ListenTimeout,
    state: SessionState,
}

impl<S, C, T, L, P> Therapist<S, C, T, L, P>
where
    S: SentimentAnalyzer,
    C: ChatModel,
    T: TtsClient,
    L: Listener,
    P: PlaybackSink,
{
    pub fn new(
        analyzer: S,
        responder: ResponseGenerator<C>,
        synthesizer: SpeechSynthesizer<T>,
        listener: L,
        playback: P,
    ) -> Self {
        Self {
            analyzer,
            responder,
            synthesizer,
            listener,
            playback,
            listen_timeout: ListenTimeout::default(),
            state: SessionState::default(),
        }
    }

    pub fn with_listen_timeout(mut self, timeout: ListenTimeout) -> Self {
        self.listen_timeout = timeout;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub async fn dispatch(&mut self, action: Action) -> Outcome {
        match action {
            Action::Submit(text) => self.submit(&text).await,
            Action::Speak => self.speak().await,
            Action::Play => self.play().await,
            Action::Summary => self.summary(),
        }
    }

    /// Empty input is ignored; anything else is logged, classified and
    /// sent exactly as typed.
    pub async fn submit(&mut self, input: &str) -> Outcome {
        if input.is_empty() {
            return Outcome::Ignored;
        }
        self.state.phase = Phase::Submitted;
        self.state.transcribed_text.clear();

        // The log only ever shows the latest exchange.
        self.state.messages.clear();
        self.state.messages.push(Message {
            sender: Sender::User,
            text: input.to_owned(),
        });

        let (category, polarity) = self.analyzer.classify(input);
        self.state.mood_history.push(MoodEntry {
            message: input.to_owned(),
            category,
            polarity,
        });
        let coping = coping::strategy_for(category);
        self.state.coping_strategy = Some(coping);
        tracing::info!(%category, polarity, "message classified");

        let reply = self.responder.generate(input).await;
        self.state.messages.push(Message {
            sender: Sender::Therapist,
            text: reply.clone(),
        });
        self.state.last_response = Some(reply.clone());

        Outcome::Replied(Exchange {
            user: input.to_owned(),
            reply,
            category,
            polarity,
            coping,
        })
    }

    pub async fn speak(&mut self) -> Outcome {
        self.state.phase = Phase::AwaitingSpeech;
        match self.listener.listen(self.listen_timeout.duration()).await {
            Ok(text) => {
                self.state.transcribed_text = text.clone();
                Outcome::Transcribed(text)
            }
            Err(e) => {
                tracing::warn!(error = %e, "listening failed");
                Outcome::ListenFailed(e)
            }
        }
    }

    pub async fn play(&mut self) -> Outcome {
        self.state.phase = Phase::PlaybackRequested;
        let Some(reply) = self
            .state
            .last_response
            .as_deref()
            .filter(|r| !r.is_empty())
        else {
            return Outcome::NothingToPlay;
        };

        let path = match self.synthesizer.synthesize(reply).await {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(error = %e, "speech synthesis failed");
                return Outcome::PlaybackFailed(format!("Could not synthesize speech: {e}"));
            }
        };

        match self.playback.play(path.clone()).await {
            Ok(()) => Outcome::Played(path),
            Err(e) => {
                tracing::warn!(error = %e, "playback failed");
                Outcome::PlaybackFailed(format!("Could not play audio: {e}"))
            }
        }
    }

    pub fn summary(&mut self) -> Outcome {
        self.state.phase = Phase::SummaryRequested;
        Outcome::Summary(MoodSummary::new(self.state.mood_history.clone()))
    }
}

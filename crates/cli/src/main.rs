#![deny(warnings)]

use ai_therapist_core::asr::{MicrophoneCapture, SpeechListener, WhisperRecognizer};
use ai_therapist_core::chat::{OllamaChatClient, ResponseGenerator};
use ai_therapist_core::config::{
    parse_base_url, resolve_optional_string, resolve_string_with_default, resolve_url, AppConfig,
    ChatConfig, Env, LangCode, ListenTimeout, ModelName, SpeechConfig, StdEnv, DEFAULT_AUDIO_FILE,
    DEFAULT_LISTEN_TIMEOUT_SECS, DEFAULT_MODEL, DEFAULT_OLLAMA_URL, DEFAULT_STT_URL,
    DEFAULT_SYSTEM_PROMPT, DEFAULT_TTS_LANG, DEFAULT_TTS_URL, ENV_AUDIO_FILE, ENV_MODEL,
    ENV_OLLAMA_HOST, ENV_OUTPUT_DEVICE, ENV_STT_URL, ENV_TTS_LANG,
};
use ai_therapist_core::playback::{AudioPlaybackSink, DummyPlaybackSink, PlaybackSink};
use ai_therapist_core::resources;
use ai_therapist_core::sentiment::LexiconSentimentAnalyzer;
use ai_therapist_core::session::{Action, Outcome, Sender, Therapist};
use ai_therapist_core::tts::{GoogleTtsClient, SpeechSynthesizer};
use anyhow::Context as _;
use clap::Parser;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use std::borrow::Cow::{self, Borrowed, Owned};
use std::path::PathBuf;
use std::time::SystemTime;
use tracing_subscriber::EnvFilter;

const PROMPT: &str = "You: ";
const CHART_WIDTH: usize = 40;

#[derive(Parser, Debug)]
#[command(name = "ai-therapist")]
#[command(about = "Talk or type to a locally hosted AI therapist")]
struct Args {
    /// Ollama model tag.
    #[arg(long)]
    model: Option<String>,

    /// Ollama server address (`host:port` or URL).
    #[arg(long)]
    ollama_url: Option<String>,

    #[arg(long, default_value = DEFAULT_SYSTEM_PROMPT)]
    system_prompt: String,

    /// Whisper transcription endpoint.
    #[arg(long)]
    stt_url: Option<String>,

    #[arg(long, default_value = DEFAULT_TTS_URL)]
    tts_url: String,

    #[arg(long)]
    tts_lang: Option<String>,

    /// Spoken replies are written here, replacing the previous one.
    #[arg(long)]
    audio_file: Option<String>,

    /// Seconds to wait for speech to start.
    #[arg(long, default_value_t = DEFAULT_LISTEN_TIMEOUT_SECS)]
    listen_timeout: u64,

    #[arg(long)]
    output_device: Option<String>,

    /// Write the audio file but do not play it.
    #[arg(long)]
    mute: bool,

    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Command {
    Speak,
    Play,
    Summary,
    Resources,
    Privacy,
    Help,
    Quit,
}

impl Command {
    const ALL: [(&'static str, Command, &'static str); 7] = [
        ("/speak", Command::Speak, "record one phrase from the microphone"),
        ("/play", Command::Play, "read the last reply aloud"),
        ("/summary", Command::Summary, "show the mood history of this session"),
        ("/resources", Command::Resources, "show crisis helplines"),
        ("/privacy", Command::Privacy, "show the data privacy disclaimer"),
        ("/help", Command::Help, "show this list"),
        ("/quit", Command::Quit, "end the session"),
    ];

    fn parse(word: &str) -> Option<Command> {
        Self::ALL
            .iter()
            .find(|(name, _, _)| *name == word)
            .map(|(_, cmd, _)| *cmd)
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Input {
    Message(String),
    Command(Command),
    Unknown(String),
    Blank,
}

/// Commands are matched on the trimmed line; messages keep the line as typed.
fn parse_input(line: &str) -> Input {
    if line.is_empty() {
        return Input::Blank;
    }
    let trimmed = line.trim();
    if trimmed.starts_with('/') {
        return match Command::parse(trimmed) {
            Some(cmd) => Input::Command(cmd),
            None if trimmed == "/exit" => Input::Command(Command::Quit),
            None => Input::Unknown(trimmed.to_owned()),
        };
    }
    Input::Message(line.to_owned())
}

#[derive(Clone)]
struct CliHelper {
    commands: Vec<&'static str>,
}

impl CliHelper {
    fn new() -> Self {
        Self {
            commands: Command::ALL.iter().map(|(name, _, _)| *name).collect(),
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];
        if !line.starts_with('/') {
            return Ok((0, vec![]));
        }
        let candidates = self
            .commands
            .iter()
            .filter(|cmd| cmd.starts_with(line))
            .map(|cmd| Pair {
                display: (*cmd).to_owned(),
                replacement: (*cmd).to_owned(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];
        if !line.starts_with('/') || line.contains(' ') {
            return None;
        }
        self.commands
            .iter()
            .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
            .map(|cmd| cmd[line.len()..].to_owned())
    }
}

impl Validator for CliHelper {}

type Session = Therapist<
    LexiconSentimentAnalyzer,
    OllamaChatClient,
    GoogleTtsClient,
    SpeechListener<MicrophoneCapture, WhisperRecognizer>,
    Box<dyn PlaybackSink>,
>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let env = StdEnv;
    let mute = args.mute;
    let cfg = build_config(args, &env)?;

    tracing::info!(
        model = %cfg.chat.model.as_str(),
        ollama = %cfg.chat.base_url,
        stt = %cfg.speech.stt_url,
        audio_file = %cfg.speech.audio_file.display(),
        "config loaded"
    );

    let mut therapist = build_session(&cfg, mute);
    run_repl(&mut therapist).await?;

    let elapsed = SystemTime::now()
        .duration_since(cfg.started_at)
        .unwrap_or_default();
    tracing::info!(
        elapsed_secs = elapsed.as_secs(),
        messages = therapist.state().mood_history().len(),
        "session ended"
    );
    Ok(())
}

fn build_session(cfg: &AppConfig, mute: bool) -> Session {
    let chat = OllamaChatClient::new(cfg.chat.base_url.clone(), cfg.chat.model.clone());
    let responder = ResponseGenerator::new(chat).with_system_prompt(cfg.chat.system_prompt.clone());

    let synthesizer = SpeechSynthesizer::new(
        GoogleTtsClient::new(cfg.speech.tts_url.clone()),
        cfg.speech.lang.clone(),
        cfg.speech.audio_file.clone(),
    );

    let listener = SpeechListener::new(
        MicrophoneCapture::default(),
        WhisperRecognizer::new(cfg.speech.stt_url.clone()),
    );

    let playback: Box<dyn PlaybackSink> = if mute {
        Box::new(DummyPlaybackSink::new())
    } else {
        let sink = match cfg.speech.output_device.as_deref() {
            Some(name) => AudioPlaybackSink::new().with_output_device_name(name),
            None => AudioPlaybackSink::new(),
        };
        Box::new(sink)
    };

    Therapist::new(
        LexiconSentimentAnalyzer::new(),
        responder,
        synthesizer,
        listener,
        playback,
    )
    .with_listen_timeout(cfg.speech.listen_timeout)
}

async fn run_repl(therapist: &mut Session) -> anyhow::Result<()> {
    let mut rl = Editor::new().context("failed to initialise line editor")?;
    rl.set_helper(Some(CliHelper::new()));

    print_welcome();

    loop {
        // A fresh transcript is offered as the next message, ready to edit or send.
        let initial = therapist.state().transcribed_text().to_owned();
        let line = match rl.readline_with_initial(PROMPT, (initial.as_str(), "")) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type /quit to exit.".yellow());
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err).context("failed to read input"),
        };

        match parse_input(&line) {
            Input::Blank => continue,
            Input::Unknown(cmd) => {
                println!("{}", format!("Unknown command {cmd}. Type /help.").bright_black());
            }
            Input::Message(text) => {
                let _ = rl.add_history_entry(text.as_str());
                println!("{}", "Thinking...".bright_black());
                let outcome = therapist.dispatch(Action::Submit(text)).await;
                render(therapist, outcome);
            }
            Input::Command(Command::Quit) => break,
            Input::Command(Command::Help) => print_help(),
            Input::Command(Command::Resources) => print_resources(),
            Input::Command(Command::Privacy) => print_privacy(),
            Input::Command(Command::Speak) => {
                println!("{}", "Listening...".bright_black());
                let outcome = therapist.dispatch(Action::Speak).await;
                render(therapist, outcome);
            }
            Input::Command(Command::Play) => {
                let outcome = therapist.dispatch(Action::Play).await;
                render(therapist, outcome);
            }
            Input::Command(Command::Summary) => {
                let outcome = therapist.dispatch(Action::Summary).await;
                render(therapist, outcome);
            }
        }
    }

    println!("{}", "Take care of yourself. Goodbye!".bright_green());
    Ok(())
}

fn render(therapist: &Session, outcome: Outcome) {
    match outcome {
        Outcome::Ignored => {}
        Outcome::Replied(exchange) => {
            println!();
            for message in therapist.state().messages() {
                let line = format!("{}: {}", message.sender, message.text);
                match message.sender {
                    Sender::User => println!("{}", line.green()),
                    Sender::Therapist => println!("{}", line.bright_blue()),
                }
            }
            println!(
                "{}",
                format!("Suggested Coping Strategy: {}", exchange.coping).yellow()
            );
            println!();
        }
        Outcome::Transcribed(text) => {
            println!("{}", format!("You said: {text}").green());
        }
        Outcome::ListenFailed(err) => {
            println!("{}", err.user_message().red());
        }
        Outcome::NothingToPlay => {
            println!("{}", "Nothing to play yet.".bright_black());
        }
        Outcome::Played(path) => {
            println!("{}", format!("Played {}", path.display()).bright_black());
        }
        Outcome::PlaybackFailed(message) => {
            println!("{}", message.red());
        }
        Outcome::Summary(summary) => {
            println!("{}", "Session Summary".bold());
            if summary.is_empty() {
                println!("{}", "No messages yet.".bright_black());
                return;
            }
            for line in summary.lines() {
                println!("{line}");
            }
            println!();
            println!("{}", "Mood Tracker Chart".bold());
            for line in summary.chart(CHART_WIDTH) {
                println!("{line}");
            }
        }
    }
}

fn print_welcome() {
    println!("{}", resources::APP_TITLE.bright_magenta().bold());
    println!("{}", resources::WELCOME_TITLE.bright_green());
    println!("{}", resources::WELCOME_PROMPT.bright_blue());
    println!();
    print_privacy();
    print_resources();
    println!(
        "{}",
        "Type a message and press Enter. /help lists commands.".bright_black()
    );
    println!();
}

fn print_privacy() {
    println!("{}", resources::PRIVACY_TITLE.red().bold());
    println!("{}", resources::PRIVACY_DISCLAIMER.red());
    println!();
}

fn print_resources() {
    println!("{}", "Resources".bold());
    println!("{}", resources::RESOURCES_INTRO);
    for line in resources::hotline_lines() {
        println!("{line}");
    }
    println!();
}

fn print_help() {
    for (name, _, description) in Command::ALL {
        println!("{}  {}", format!("{name:<11}").bright_cyan(), description);
    }
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(
            level
                .parse()
                .with_context(|| format!("invalid --log-level: {level}"))?,
        )
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn build_config(args: Args, env: &impl Env) -> anyhow::Result<AppConfig> {
    let model = ModelName::new(resolve_string_with_default(
        args.model,
        ENV_MODEL,
        env,
        DEFAULT_MODEL,
    ))?;
    let base_url = resolve_url(args.ollama_url, ENV_OLLAMA_HOST, env, DEFAULT_OLLAMA_URL)
        .context("invalid Ollama address")?;

    let lang = LangCode::new(resolve_string_with_default(
        args.tts_lang,
        ENV_TTS_LANG,
        env,
        DEFAULT_TTS_LANG,
    ))?;
    let tts_url = parse_base_url(&args.tts_url).context("invalid --tts-url")?;
    let stt_url =
        resolve_url(args.stt_url, ENV_STT_URL, env, DEFAULT_STT_URL).context("invalid STT URL")?;
    let audio_file = PathBuf::from(resolve_string_with_default(
        args.audio_file,
        ENV_AUDIO_FILE,
        env,
        DEFAULT_AUDIO_FILE,
    ));

    Ok(AppConfig {
        chat: ChatConfig {
            base_url,
            model,
            system_prompt: args.system_prompt,
        },
        speech: SpeechConfig {
            tts_url,
            lang,
            audio_file,
            stt_url,
            listen_timeout: ListenTimeout::new(args.listen_timeout)?,
            output_device: resolve_optional_string(args.output_device, ENV_OUTPUT_DEVICE, env),
        },
        started_at: SystemTime::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ai_therapist_core::config::MapEnv;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["ai-therapist"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn plain_text_is_a_message() {
        assert_eq!(
            parse_input("  I feel anxious  "),
            Input::Message("  I feel anxious  ".to_owned())
        );
        assert_eq!(parse_input("   "), Input::Message("   ".to_owned()));
        assert_eq!(parse_input(""), Input::Blank);
    }

    #[test]
    fn slash_words_are_commands() {
        assert_eq!(parse_input("/speak"), Input::Command(Command::Speak));
        assert_eq!(parse_input(" /summary "), Input::Command(Command::Summary));
        assert_eq!(parse_input("/exit"), Input::Command(Command::Quit));
        assert_eq!(parse_input("/dance"), Input::Unknown("/dance".to_owned()));
    }

    #[test]
    fn defaults_without_flags_or_env() {
        let cfg = build_config(args(&[]), &MapEnv::default()).unwrap();
        assert_eq!(cfg.chat.model.as_str(), "tinyllama");
        assert_eq!(cfg.chat.base_url.as_str(), "http://localhost:11434/");
        assert_eq!(cfg.speech.audio_file, PathBuf::from("response.mp3"));
        assert_eq!(cfg.speech.lang.as_str(), "en");
        assert_eq!(cfg.speech.listen_timeout.secs, 5);
        assert_eq!(cfg.speech.output_device, None);
    }

    #[test]
    fn env_fills_in_and_flags_win() {
        let env = MapEnv::default()
            .with_var(ENV_OLLAMA_HOST, "10.0.0.2:11434")
            .with_var(ENV_MODEL, "llama3")
            .with_var(ENV_OUTPUT_DEVICE, "Speakers");
        let cfg = build_config(args(&["--model", "phi3"]), &env).unwrap();
        assert_eq!(cfg.chat.model.as_str(), "phi3");
        assert_eq!(cfg.chat.base_url.as_str(), "http://10.0.0.2:11434/");
        assert_eq!(cfg.speech.output_device.as_deref(), Some("Speakers"));
    }

    #[test]
    fn zero_listen_timeout_is_rejected() {
        assert!(build_config(args(&["--listen-timeout", "0"]), &MapEnv::default()).is_err());
    }

    #[test]
    fn every_command_completes_from_its_prefix() {
        let helper = CliHelper::new();
        for (name, cmd, _) in Command::ALL {
            assert_eq!(Command::parse(name), Some(cmd));
            assert!(helper.commands.contains(&name));
        }
    }
}

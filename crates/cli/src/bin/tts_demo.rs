#![deny(warnings)]

//! Speaks one fixed greeting through the same synthesis and playback path
//! the interactive session uses.

use ai_therapist_core::config::{
    parse_base_url, resolve_optional_string, resolve_string_with_default, LangCode, StdEnv,
    DEFAULT_AUDIO_FILE, DEFAULT_TTS_LANG, DEFAULT_TTS_URL, ENV_AUDIO_FILE, ENV_OUTPUT_DEVICE,
    ENV_TTS_LANG,
};
use ai_therapist_core::playback::{AudioPlaybackSink, PlaybackSink};
use ai_therapist_core::tts::{GoogleTtsClient, SpeechSynthesizer};
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const GREETING: &str = "Hello, I'm your AI therapist. How are you feeling today?";

#[derive(Parser, Debug)]
#[command(name = "tts-demo")]
#[command(about = "Synthesize a greeting to an MP3 file and play it")]
struct Args {
    #[arg(long, default_value = GREETING)]
    text: String,

    #[arg(long)]
    lang: Option<String>,

    #[arg(long)]
    audio_file: Option<String>,

    #[arg(long, default_value = DEFAULT_TTS_URL)]
    tts_url: String,

    #[arg(long)]
    output_device: Option<String>,

    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let env = StdEnv;
    let lang = LangCode::new(resolve_string_with_default(
        args.lang,
        ENV_TTS_LANG,
        &env,
        DEFAULT_TTS_LANG,
    ))?;
    let audio_file = PathBuf::from(resolve_string_with_default(
        args.audio_file,
        ENV_AUDIO_FILE,
        &env,
        DEFAULT_AUDIO_FILE,
    ));
    let endpoint = parse_base_url(&args.tts_url).context("invalid --tts-url")?;

    let synthesizer = SpeechSynthesizer::new(GoogleTtsClient::new(endpoint), lang, audio_file);
    let path = synthesizer
        .synthesize(&args.text)
        .await
        .context("speech synthesis failed")?;

    let sink = match resolve_optional_string(args.output_device, ENV_OUTPUT_DEVICE, &env) {
        Some(name) => AudioPlaybackSink::new().with_output_device_name(name),
        None => AudioPlaybackSink::new(),
    };
    println!("Playing {}", path.display());
    sink.play(path.clone())
        .await
        .with_context(|| format!("failed to play {}", path.display()))?;
    Ok(())
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

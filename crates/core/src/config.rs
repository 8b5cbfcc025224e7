use serde::{Deserialize, Serialize};
use std::{
    path::PathBuf,
    time::{Duration, SystemTime},
};
use url::Url;

pub const DEFAULT_MODEL: &str = "tinyllama";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";
pub const DEFAULT_TTS_URL: &str = "https://translate.google.com/translate_tts";
pub const DEFAULT_TTS_LANG: &str = "en";
pub const DEFAULT_AUDIO_FILE: &str = "response.mp3";
pub const DEFAULT_STT_URL: &str = "http://localhost:9000/transcribe";
pub const DEFAULT_LISTEN_TIMEOUT_SECS: u64 = 5;
pub const ENV_OLLAMA_HOST: &str = "OLLAMA_HOST";
pub const ENV_MODEL: &str = "THERAPIST_MODEL";
pub const ENV_STT_URL: &str = "THERAPIST_STT_URL";
pub const ENV_TTS_LANG: &str = "THERAPIST_TTS_LANG";
pub const ENV_AUDIO_FILE: &str = "THERAPIST_AUDIO_FILE";
pub const ENV_OUTPUT_DEVICE: &str = "THERAPIST_OUTPUT_DEVICE";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelName(String);

impl ModelName {
    pub fn new<S: Into<String>>(value: S) -> Result<Self, ConfigError> {
        let v = value.into();
        if v.trim().is_empty() {
            return Err(ConfigError::EmptyModelName);
        }
        Ok(Self(v.trim().to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ModelName {
    fn default() -> Self {
        Self(DEFAULT_MODEL.to_owned())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LangCode(String);

impl LangCode {
    pub fn new<S: Into<String>>(value: S) -> Result<Self, ConfigError> {
        let v = value.into();
        if v.trim().is_empty() {
            return Err(ConfigError::EmptyLangCode);
        }
        Ok(Self(v.trim().to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for LangCode {
    fn default() -> Self {
        Self(DEFAULT_TTS_LANG.to_owned())
    }
}

/// How long the microphone waits for a phrase to start.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListenTimeout {
    pub secs: u64,
}

impl ListenTimeout {
    pub fn new(secs: u64) -> Result<Self, ConfigError> {
        if secs == 0 {
            return Err(ConfigError::ZeroListenTimeout);
        }
        Ok(Self { secs })
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.secs)
    }
}

impl Default for ListenTimeout {
    fn default() -> Self {
        Self {
            secs: DEFAULT_LISTEN_TIMEOUT_SECS,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatConfig {
    pub base_url: Url,
    pub model: ModelName,
    pub system_prompt: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpeechConfig {
    pub tts_url: Url,
    pub lang: LangCode,
    pub audio_file: PathBuf,
    pub stt_url: Url,
    pub listen_timeout: ListenTimeout,
    pub output_device: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    pub chat: ChatConfig,
    pub speech: SpeechConfig,
    pub started_at: SystemTime,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("model name must not be empty")]
    EmptyModelName,
    #[error("language code must not be empty")]
    EmptyLangCode,
    #[error("listen timeout must be > 0 s")]
    ZeroListenTimeout,
    #[error("invalid url {value:?}: {source}")]
    InvalidUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
}

pub trait Env {
    fn var(&self, key: &str) -> Option<String>;
}

#[derive(Clone, Debug, Default)]
pub struct StdEnv;

impl Env for StdEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Clone, Debug, Default)]
pub struct MapEnv {
    vars: std::collections::BTreeMap<String, String>,
}

impl MapEnv {
    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_owned(), value.to_owned());
        self
    }
}

impl Env for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

pub fn resolve_string_with_default(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
    default: &str,
) -> String {
    match cli_value {
        Some(v) => v,
        None => env.var(env_key).unwrap_or_else(|| default.to_owned()),
    }
}

pub fn resolve_optional_string(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
) -> Option<String> {
    match cli_value {
        Some(v) => Some(v),
        None => env.var(env_key),
    }
}

/// Parses a service address, accepting the bare `host:port` form that
/// `OLLAMA_HOST` is commonly set to.
pub fn parse_base_url(value: &str) -> Result<Url, ConfigError> {
    let trimmed = value.trim();
    let candidate = if trimmed.contains("://") {
        trimmed.to_owned()
    } else {
        format!("http://{trimmed}")
    };
    Url::parse(&candidate).map_err(|source| ConfigError::InvalidUrl {
        value: value.to_owned(),
        source,
    })
}

pub fn resolve_url(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
    default: &str,
) -> Result<Url, ConfigError> {
    parse_base_url(&resolve_string_with_default(cli_value, env_key, env, default))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_cli_takes_precedence_over_env() {
        let env = MapEnv::default().with_var(ENV_MODEL, "llama3");
        let v = resolve_string_with_default(Some("phi3".to_owned()), ENV_MODEL, &env, DEFAULT_MODEL);
        assert_eq!(v, "phi3");
    }

    #[test]
    fn model_env_used_when_cli_missing() {
        let env = MapEnv::default().with_var(ENV_MODEL, "llama3");
        let v = resolve_string_with_default(None, ENV_MODEL, &env, DEFAULT_MODEL);
        assert_eq!(v, "llama3");
    }

    #[test]
    fn model_default_used_when_both_missing() {
        let env = MapEnv::default();
        let v = resolve_string_with_default(None, ENV_MODEL, &env, DEFAULT_MODEL);
        assert_eq!(v, "tinyllama");
    }

    #[test]
    fn blank_model_name_is_rejected() {
        assert_eq!(ModelName::new("  "), Err(ConfigError::EmptyModelName));
    }

    #[test]
    fn model_name_from_env_is_trimmed() {
        let env = MapEnv::default().with_var(ENV_MODEL, " phi3 ");
        let raw = resolve_string_with_default(None, ENV_MODEL, &env, DEFAULT_MODEL);
        assert_eq!(ModelName::new(raw).unwrap().as_str(), "phi3");
    }

    #[test]
    fn zero_listen_timeout_is_rejected() {
        assert_eq!(ListenTimeout::new(0), Err(ConfigError::ZeroListenTimeout));
        assert_eq!(ListenTimeout::default().duration(), Duration::from_secs(5));
    }

    #[test]
    fn ollama_host_without_scheme_gets_http() {
        let env = MapEnv::default().with_var(ENV_OLLAMA_HOST, "127.0.0.1:11500");
        let url = resolve_url(None, ENV_OLLAMA_HOST, &env, DEFAULT_OLLAMA_URL).expect("valid url");
        assert_eq!(url.as_str(), "http://127.0.0.1:11500/");
    }

    #[test]
    fn default_urls_parse() {
        for raw in [DEFAULT_OLLAMA_URL, DEFAULT_TTS_URL, DEFAULT_STT_URL] {
            assert!(parse_base_url(raw).is_ok(), "{raw} should parse");
        }
    }

    #[test]
    fn garbage_url_is_rejected() {
        let err = parse_base_url("http://exa mple.com").expect_err("invalid");
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));
    }

    #[test]
    fn optional_output_device_falls_back_to_env() {
        let env = MapEnv::default().with_var(ENV_OUTPUT_DEVICE, "Headphones");
        assert_eq!(
            resolve_optional_string(None, ENV_OUTPUT_DEVICE, &env).as_deref(),
            Some("Headphones")
        );
        assert_eq!(resolve_optional_string(None, ENV_OUTPUT_DEVICE, &MapEnv::default()), None);
    }
}

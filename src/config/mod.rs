//! Configuration management for the Misty voice loop
//!
//! Precedence is CLI flags > environment > TOML file > defaults. The CLI
//! layer is applied by the binary after [`Config::load`].

pub mod file;

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::{Error, Result};

pub use file::MistyConfigFile;

/// Robot address used when nothing else is configured
pub const DEFAULT_ROBOT_ADDRESS: &str = "192.168.1.20";

/// Forward speed for timed moves
pub const DEFAULT_LINEAR_VELOCITY: f64 = 1.0;

/// Completion model
pub const DEFAULT_LLM_MODEL: &str = "gpt-4";

/// OpenAI-compatible API base
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";

/// Wake phrase for the gated loop
pub const DEFAULT_WAKE_WORD: &str = "hey misty";

const DEFAULT_CALIBRATION_MS: u64 = 1000;

/// Misty voice loop configuration
#[derive(Debug)]
pub struct Config {
    /// Robot connection
    pub robot: RobotConfig,

    /// Completion service
    pub llm: LlmConfig,

    /// Voice capture
    pub voice: VoiceConfig,

    /// API keys
    pub api_keys: ApiKeys,
}

/// Robot connection configuration
#[derive(Debug, Clone)]
pub struct RobotConfig {
    /// IP address, `host:port`, or full base URL of the robot
    pub address: String,

    /// Forward speed used by timed moves
    pub linear_velocity: f64,
}

impl RobotConfig {
    /// Resolve the address into an HTTP base URL
    ///
    /// A bare host such as `192.168.1.20` becomes `http://192.168.1.20/`.
    ///
    /// # Errors
    ///
    /// Returns error if the address is not a valid URL or host
    pub fn base_url(&self) -> Result<Url> {
        let address = self.address.trim();
        if address.is_empty() {
            return Err(Error::Config("robot address is empty".to_string()));
        }

        let raw = if address.contains("://") {
            address.to_string()
        } else {
            format!("http://{address}")
        };

        Url::parse(&raw)
            .map_err(|e| Error::Config(format!("invalid robot address '{address}': {e}")))
    }
}

/// Completion service configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Model identifier for chat completions
    pub model: String,

    /// OpenAI-compatible API base URL
    pub base_url: String,
}

/// STT backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SttProvider {
    /// `OpenAI` Whisper transcription API
    Whisper,
    /// Deepgram listen API
    Deepgram,
}

impl SttProvider {
    /// Default model for this provider
    #[must_use]
    pub const fn default_model(self) -> &'static str {
        match self {
            Self::Whisper => "whisper-1",
            Self::Deepgram => "nova-2",
        }
    }
}

impl FromStr for SttProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "whisper" | "openai" => Ok(Self::Whisper),
            "deepgram" => Ok(Self::Deepgram),
            other => Err(Error::Config(format!("unknown STT provider: {other}"))),
        }
    }
}

/// Voice capture configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// STT backend
    pub stt_provider: SttProvider,

    /// STT model
    pub stt_model: String,

    /// STT API base URL override
    pub stt_base_url: Option<String>,

    /// Wake phrase, stored lowercase
    pub wake_word: String,

    /// Only handle utterances that contain the wake phrase
    pub wake_word_required: bool,

    /// Ask whether to continue after each answer; a negative answer exits
    pub ask_to_continue: bool,

    /// Ambient noise calibration window
    pub calibration: Duration,
}

/// API keys for external services
#[derive(Debug, Default)]
pub struct ApiKeys {
    /// `OpenAI` API key (completions and Whisper)
    pub openai: Option<SecretString>,

    /// `Deepgram` API key (optional STT)
    pub deepgram: Option<SecretString>,
}

impl Config {
    /// Load configuration from the process environment and a TOML file
    ///
    /// `path` overrides the standard config file location; an explicit path
    /// must exist and parse.
    ///
    /// # Errors
    ///
    /// Returns error if an explicit config file is unreadable or a value is invalid
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let fc = match path {
            Some(path) => MistyConfigFile::read(path)?,
            None => file::load_config_file(),
        };

        Self::resolve(fc, |key| std::env::var(key).ok())
    }

    /// Merge a parsed config file with environment values
    ///
    /// `env` looks up a variable by name (env > toml > default).
    ///
    /// # Errors
    ///
    /// Returns error if the STT provider is unknown
    pub fn resolve(fc: MistyConfigFile, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let robot = RobotConfig {
            address: env("MISTY_IP")
                .or(fc.robot.address)
                .unwrap_or_else(|| DEFAULT_ROBOT_ADDRESS.to_string()),
            linear_velocity: env("MISTY_LINEAR_VELOCITY")
                .and_then(|s| s.parse::<f64>().ok())
                .filter(|v| v.is_finite())
                .or(fc.robot.linear_velocity.filter(|v| v.is_finite()))
                .unwrap_or(DEFAULT_LINEAR_VELOCITY),
        };

        let llm = LlmConfig {
            model: env("MISTY_LLM_MODEL")
                .or(fc.llm.model)
                .unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            base_url: env("MISTY_LLM_BASE_URL")
                .or(fc.llm.base_url)
                .unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string()),
        };

        let stt_provider = env("MISTY_STT_PROVIDER")
            .or(fc.voice.stt_provider)
            .map(|s| s.parse::<SttProvider>())
            .transpose()?
            .unwrap_or(SttProvider::Whisper);

        let voice = VoiceConfig {
            stt_provider,
            stt_model: env("MISTY_STT_MODEL")
                .or(fc.voice.stt_model)
                .unwrap_or_else(|| stt_provider.default_model().to_string()),
            stt_base_url: env("MISTY_STT_BASE_URL").or(fc.voice.stt_base_url),
            wake_word: env("MISTY_WAKE_WORD")
                .or(fc.voice.wake_word)
                .unwrap_or_else(|| DEFAULT_WAKE_WORD.to_string())
                .trim()
                .to_lowercase(),
            wake_word_required: fc.voice.wake_word_required.unwrap_or(true),
            ask_to_continue: fc.voice.ask_to_continue.unwrap_or(false),
            calibration: Duration::from_millis(
                fc.voice.calibration_ms.unwrap_or(DEFAULT_CALIBRATION_MS),
            ),
        };

        if voice.wake_word_required && voice.wake_word.is_empty() {
            return Err(Error::Config(
                "wake word required but wake_word is empty".to_string(),
            ));
        }

        let api_keys = ApiKeys {
            openai: env("OPENAI_API_KEY")
                .or(fc.api_keys.openai)
                .filter(|k| !k.is_empty())
                .map(SecretString::from),
            deepgram: env("DEEPGRAM_API_KEY")
                .or(fc.api_keys.deepgram)
                .filter(|k| !k.is_empty())
                .map(SecretString::from),
        };

        Ok(Self {
            robot,
            llm,
            voice,
            api_keys,
        })
    }
}

//! TOML configuration file loading
//!
//! Supports `~/.config/misty/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct MistyConfigFile {
    /// Robot connection settings
    #[serde(default)]
    pub robot: RobotFileConfig,

    /// Completion service settings
    #[serde(default)]
    pub llm: LlmFileConfig,

    /// Voice capture settings
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,
}

/// Robot connection settings
#[derive(Debug, Default, Deserialize)]
pub struct RobotFileConfig {
    /// Robot IP address, `host:port`, or full base URL
    pub address: Option<String>,

    /// Forward speed used by `move <N> seconds`
    pub linear_velocity: Option<f64>,
}

/// Completion service settings
#[derive(Debug, Default, Deserialize)]
pub struct LlmFileConfig {
    /// Model identifier (e.g. "gpt-4")
    pub model: Option<String>,

    /// OpenAI-compatible API base URL
    pub base_url: Option<String>,
}

/// Voice capture settings
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// STT backend ("whisper" or "deepgram")
    pub stt_provider: Option<String>,

    /// STT model (e.g. "whisper-1", "nova-2")
    pub stt_model: Option<String>,

    /// STT API base URL override
    pub stt_base_url: Option<String>,

    /// Wake phrase (e.g. "hey misty")
    pub wake_word: Option<String>,

    /// Require the wake phrase before handling an utterance
    pub wake_word_required: Option<bool>,

    /// Ask "another question?" after each answer
    pub ask_to_continue: Option<bool>,

    /// Ambient noise calibration window in milliseconds
    pub calibration_ms: Option<u64>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub openai: Option<String>,
    pub deepgram: Option<String>,
}

impl MistyConfigFile {
    /// Parse a config file from TOML text
    ///
    /// # Errors
    ///
    /// Returns error if the TOML is malformed
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Read and parse a config file, failing if it is missing or invalid
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::parse(&content)?;
        tracing::info!(path = %path.display(), "loaded config file");
        Ok(config)
    }
}

/// Load the TOML config file from the standard path
///
/// Returns `MistyConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> MistyConfigFile {
    let Some(path) = config_file_path() else {
        return MistyConfigFile::default();
    };

    if !path.exists() {
        return MistyConfigFile::default();
    }

    match MistyConfigFile::read(&path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to load config file, using defaults"
            );
            MistyConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/misty/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("misty").join("config.toml"))
}

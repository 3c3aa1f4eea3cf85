//! Widget settings loaded from TOML files
//!
//! A settings file is optional. Every section and every key falls back to a
//! default, so an empty file is valid:
//!
//! ```toml
//! [service]
//! url = "http://127.0.0.1:8000"
//! timeout_secs = 60
//!
//! [ui]
//! greeting = "Hello, I am your Legal Advisor. How can I assist you?"
//!
//! [speech]
//! lang = "en-IN"
//! rate = 1.0
//! tts_command = ["espeak-ng", "-v", "{lang}"]
//! stt_command = ["python3", "listen_once.py", "--lang", "{lang}"]
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root settings file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Answer service endpoint
    #[serde(default)]
    pub service: ServiceSettings,

    /// Transcript behaviour
    #[serde(default)]
    pub ui: UiSettings,

    /// Speech capabilities
    #[serde(default)]
    pub speech: SpeechSettings,
}

impl Settings {
    /// Load settings from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load settings from a TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service.url.trim().is_empty() {
            return Err(ConfigError::Validation(
                "service.url must not be empty".into(),
            ));
        }
        if !(self.speech.rate > 0.0 && self.speech.rate <= 10.0) {
            return Err(ConfigError::Validation(format!(
                "speech.rate must be in (0, 10], got {}",
                self.speech.rate
            )));
        }
        Ok(())
    }
}

/// Answer service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSettings {
    /// Base URL; `/ask` and `/health` are appended
    #[serde(default = "default_url")]
    pub url: String,

    /// Request timeout in seconds (0 disables the timeout)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            url: default_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiSettings {
    /// Assistant message shown (and spoken) at startup; empty disables it
    #[serde(default = "default_greeting")]
    pub greeting: String,
}

fn default_greeting() -> String {
    "Hello, I am your Legal Advisor. How can I assist you?".to_string()
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            greeting: default_greeting(),
        }
    }
}

/// Speech capability settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechSettings {
    /// BCP 47 language tag handed to both commands
    #[serde(default = "default_lang")]
    pub lang: String,

    /// Speaking rate, 1.0 is normal
    #[serde(default = "default_rate")]
    pub rate: f32,

    /// Text-to-speech argv; the text is appended as the last argument
    #[serde(default = "default_tts_command")]
    pub tts_command: Vec<String>,

    /// One-shot speech-to-text argv; prints the final transcript on stdout
    #[serde(default)]
    pub stt_command: Vec<String>,
}

fn default_lang() -> String {
    "en-IN".to_string()
}

fn default_rate() -> f32 {
    1.0
}

fn default_tts_command() -> Vec<String> {
    vec!["espeak-ng".into(), "-v".into(), "{lang}".into()]
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            lang: default_lang(),
            rate: default_rate(),
            tts_command: default_tts_command(),
            stt_command: Vec::new(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

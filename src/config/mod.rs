//! Application configuration

pub mod file;

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::speech::VoiceOptions;

pub use file::{ConfigError, Settings};

#[derive(Debug, Clone)]
pub struct Config {
    pub service_url: String,
    pub request_timeout: Option<Duration>,
    pub greeting: Option<String>,
    pub voice: VoiceOptions,
    pub tts_command: Vec<String>,
    pub stt_command: Vec<String>,
}

impl Config {
    /// Read the optional settings file named by `VOICE_CHAT_CONFIG`, then
    /// apply environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let settings = match env::var("VOICE_CHAT_CONFIG") {
            Ok(path) => {
                let path = PathBuf::from(path);
                tracing::info!("Loading settings from {}", path.display());
                Settings::from_file(&path)?
            }
            Err(_) => Settings::default(),
        };

        Self::resolve(settings, |key| env::var(key).ok())
    }

    /// Merge file settings with overrides from `lookup`
    pub fn resolve(
        mut settings: Settings,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(url) = lookup("VOICE_CHAT_URL") {
            settings.service.url = url;
        }
        if let Some(secs) = lookup("VOICE_CHAT_TIMEOUT_SECS") {
            settings.service.timeout_secs = secs.parse().map_err(|_| {
                ConfigError::Validation(format!("VOICE_CHAT_TIMEOUT_SECS is not a number: {}", secs))
            })?;
        }
        if let Some(lang) = lookup("VOICE_CHAT_LANG") {
            settings.speech.lang = lang;
        }
        settings.validate()?;

        let greeting = settings.ui.greeting.trim();

        Ok(Self {
            service_url: settings.service.url.trim_end_matches('/').to_string(),
            request_timeout: match settings.service.timeout_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            greeting: (!greeting.is_empty()).then(|| greeting.to_string()),
            voice: VoiceOptions {
                lang: settings.speech.lang,
                rate: settings.speech.rate,
            },
            tts_command: settings.speech.tts_command,
            stt_command: settings.speech.stt_command,
        })
    }
}

//! Speech capabilities
//!
//! Both directions are narrow traits so the widget never cares where audio
//! comes from or goes to. The shipped implementations drive external
//! programs (see [`command`]).

pub mod command;

use async_trait::async_trait;
use thiserror::Error;

pub use command::{CommandRecognizer, CommandSpeaker};

/// Language and rate used for every utterance and listening session
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceOptions {
    pub lang: String,
    pub rate: f32,
}

impl Default for VoiceOptions {
    fn default() -> Self {
        Self {
            lang: "en-IN".to_string(),
            rate: 1.0,
        }
    }
}

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("Failed to launch speech command: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Speech command failed: {0}")]
    Failed(String),
}

/// Text-to-speech
pub trait SpeechOutput: Send + Sync {
    /// Start speaking `text` and return without waiting for it to finish.
    ///
    /// Earlier utterances keep playing; callers that want one voice at a
    /// time call `cancel_all` first.
    fn speak(&self, text: &str, options: &VoiceOptions) -> Result<(), SpeechError>;

    /// Stop every utterance that is still playing
    fn cancel_all(&self);
}

/// Speech-to-text, one listening session per call
#[async_trait]
pub trait SpeechInput: Send + Sync {
    /// Listen once. `Ok(None)` means the session ended without a transcript.
    async fn start_once(&self, options: &VoiceOptions) -> Result<Option<String>, SpeechError>;
}

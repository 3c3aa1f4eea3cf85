//! Chat widget controller
//!
//! The ChatWidget owns every piece of mutable UI state and is driven by a
//! single stream of [`UiEvent`]s:
//! 1. User input (typing, Enter, send/mic/clear controls) arrives from the front end
//! 2. A submission appends the user message and spawns one request task
//! 3. The request task posts the answer back as another event
//! 4. The answer is rendered and spoken
//!
//! Background tasks never touch the widget; they only send events, so all
//! state changes happen inside [`ChatWidget::handle`].

use std::iter;
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;

use crate::conversation::{Role, Transcript};
use crate::service::{AnswerService, AskResponse, ServiceError};
use crate::speech::{SpeechInput, SpeechOutput, VoiceOptions};

use super::view::{Status, View};

/// Rendered in place of an answer when the request fails
pub const REQUEST_FAILED: &str = "Request failed. Please retry.";

/// Microphone label when speech recognition is unavailable
pub const MIC_UNSUPPORTED: &str = "Speech not supported";

/// Shown when input arrives while an answer is still outstanding
pub const STILL_WAITING: &str = "Still waiting for the previous answer, try again once it arrives.";

/// Everything the widget reacts to
#[derive(Debug)]
pub enum UiEvent {
    /// Text typed into the input field
    Typed(String),

    /// Enter key; with shift held it inserts a newline instead of sending
    EnterPressed { shift: bool },

    SendClicked,
    MicClicked,
    ClearClicked,

    /// Outcome of the request started by a submission
    AnswerReceived(Result<AskResponse, ServiceError>),

    Recognition(RecognitionEvent),

    Shutdown,
}

/// Events of one listening session. Every session ends with `End`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    Transcript(String),
    Error(String),
    End,
}

/// The chat widget controller
pub struct ChatWidget<V: View> {
    view: V,
    transcript: Transcript,
    status: Status,
    input: String,
    /// A request is in flight; submissions are dropped until it resolves
    pending: bool,
    listening: bool,
    service: Arc<dyn AnswerService>,
    speech_output: Option<Arc<dyn SpeechOutput>>,
    speech_input: Option<Arc<dyn SpeechInput>>,
    voice: VoiceOptions,
    events: UnboundedSender<UiEvent>,
}

impl<V: View> ChatWidget<V> {
    /// Create a widget without speech capabilities.
    ///
    /// `events` must feed the same channel the caller passes to `handle`.
    pub fn new(view: V, service: Arc<dyn AnswerService>, events: UnboundedSender<UiEvent>) -> Self {
        Self {
            view,
            transcript: Transcript::new(),
            status: Status::Idle,
            input: String::new(),
            pending: false,
            listening: false,
            service,
            speech_output: None,
            speech_input: None,
            voice: VoiceOptions::default(),
            events,
        }
    }

    pub fn with_speech_output(mut self, output: Arc<dyn SpeechOutput>) -> Self {
        self.speech_output = Some(output);
        self
    }

    pub fn with_speech_input(mut self, input: Arc<dyn SpeechInput>) -> Self {
        self.speech_input = Some(input);
        self
    }

    pub fn with_voice(mut self, voice: VoiceOptions) -> Self {
        self.voice = voice;
        self
    }

    /// Prepare the view and show the optional greeting
    pub fn mount(&mut self, greeting: Option<&str>) {
        if self.speech_input.is_none() {
            tracing::info!("Speech recognition unavailable, microphone disabled");
            self.view.disable_mic(MIC_UNSUPPORTED);
        }
        if self.speech_output.is_none() {
            tracing::info!("Text-to-speech unavailable, replies will not be spoken");
        }

        self.set_status(Status::Idle);
        self.view.set_send_enabled(true);

        if let Some(greeting) = greeting {
            self.append(Role::Assistant, greeting.to_string());
        }
    }

    /// Process one event to completion
    pub fn handle(&mut self, event: UiEvent) {
        match event {
            UiEvent::Typed(text) => {
                self.input.push_str(&text);
                self.view.set_input(&self.input);
            }
            UiEvent::EnterPressed { shift: true } => {
                self.input.push('\n');
                self.view.set_input(&self.input);
            }
            UiEvent::EnterPressed { shift: false } | UiEvent::SendClicked => {
                let raw = self.input.clone();
                if !self.submit(&raw) && self.pending && !raw.trim().is_empty() {
                    // Dropped text must not leak into the next question
                    self.input.clear();
                    self.view.set_input("");
                }
            }
            UiEvent::MicClicked => self.start_listening(),
            UiEvent::ClearClicked => self.clear(),
            UiEvent::AnswerReceived(result) => self.on_answer(result),
            UiEvent::Recognition(event) => self.on_recognition(event),
            UiEvent::Shutdown => self.shutdown(),
        }
    }

    /// Send `raw` to the answer service and return whether it was sent.
    ///
    /// Blank input is ignored, as is anything submitted while a request is
    /// still in flight. The service receives `raw` untrimmed.
    pub fn submit(&mut self, raw: &str) -> bool {
        let query = raw.trim();
        if query.is_empty() {
            return false;
        }
        if self.pending {
            tracing::debug!("Request in flight, dropping submission");
            self.view.show_notice(STILL_WAITING);
            return false;
        }

        self.append(Role::User, query.to_string());
        self.input.clear();
        self.view.set_input("");
        self.set_status(Status::Thinking);

        self.pending = true;
        self.view.set_send_enabled(false);

        let service = Arc::clone(&self.service);
        let events = self.events.clone();
        let raw = raw.to_string();
        tokio::spawn(async move {
            let result = service.ask(&raw).await;
            if events.send(UiEvent::AnswerReceived(result)).is_err() {
                tracing::debug!("Widget closed before the answer arrived");
            }
        });
        true
    }

    /// Remove every message from the transcript and the view
    pub fn clear(&mut self) {
        self.transcript.clear();
        self.view.clear_messages();
    }

    #[cfg(test)]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    #[cfg(test)]
    pub fn status(&self) -> Status {
        self.status
    }

    #[cfg(test)]
    pub fn input(&self) -> &str {
        &self.input
    }

    #[cfg(test)]
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    #[cfg(test)]
    pub fn view(&self) -> &V {
        &self.view
    }

    fn append(&mut self, role: Role, text: String) {
        let message = self.transcript.push(role, text);
        self.view.render_message(message);
        self.view.scroll_to_latest();

        if role == Role::Assistant {
            Self::speak(self.speech_output.as_deref(), &self.voice, &message.text);
        }
    }

    fn speak(output: Option<&dyn SpeechOutput>, voice: &VoiceOptions, text: &str) {
        let Some(output) = output else {
            return;
        };

        // speak() leaves earlier utterances alone, stopping them is ours
        output.cancel_all();
        if let Err(e) = output.speak(text, voice) {
            tracing::warn!(error = %e, "Could not start utterance");
        }
    }

    fn set_status(&mut self, status: Status) {
        self.status = status;
        self.view.set_status(status);
    }

    fn on_answer(&mut self, result: Result<AskResponse, ServiceError>) {
        self.pending = false;
        self.view.set_send_enabled(true);

        let text = match result {
            Ok(response) => response.into_text(),
            Err(e) => {
                tracing::warn!(error = %e, "Answer request failed");
                REQUEST_FAILED.to_string()
            }
        };

        self.append(Role::Assistant, text);
        self.set_status(Status::Idle);
    }

    fn start_listening(&mut self) {
        let Some(input) = self.speech_input.clone() else {
            tracing::debug!("Microphone is disabled");
            return;
        };
        if self.listening {
            tracing::debug!("Already listening");
            return;
        }
        if self.pending {
            tracing::debug!("Request in flight, microphone ignored");
            self.view.show_notice(STILL_WAITING);
            return;
        }

        self.listening = true;
        self.set_status(Status::Listening);

        let events = self.events.clone();
        let voice = self.voice.clone();
        tokio::spawn(async move {
            let outcome = match input.start_once(&voice).await {
                Ok(Some(text)) => Some(RecognitionEvent::Transcript(text)),
                Ok(None) => None,
                Err(e) => Some(RecognitionEvent::Error(e.to_string())),
            };

            for event in outcome.into_iter().chain(iter::once(RecognitionEvent::End)) {
                if events.send(UiEvent::Recognition(event)).is_err() {
                    break;
                }
            }
        });
    }

    fn on_recognition(&mut self, event: RecognitionEvent) {
        match event {
            RecognitionEvent::Transcript(text) => {
                self.listening = false;
                tracing::info!(transcript = %text, "Speech recognized");
                self.submit(&text);
            }
            RecognitionEvent::Error(detail) => {
                self.listening = false;
                tracing::warn!(error = %detail, "Speech recognition failed");
                self.set_status(Status::MicError);
            }
            RecognitionEvent::End => {
                self.listening = false;
                // A transcript may already have moved the status on
                if self.status == Status::Listening {
                    self.set_status(Status::Idle);
                }
            }
        }
    }

    fn shutdown(&mut self) {
        if let Some(output) = &self.speech_output {
            output.cancel_all();
        }
    }
}

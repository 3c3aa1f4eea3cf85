//! What the widget draws on

use std::fmt;

use crate::conversation::Message;

/// The status readout. These four strings are the only values it shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Idle,
    Thinking,
    Listening,
    MicError,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Idle => "Idle",
            Status::Thinking => "Thinking...",
            Status::Listening => "Listening...",
            Status::MicError => "Mic error",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rendering surface driven by [`ChatWidget`](super::ChatWidget).
///
/// Calls are synchronous and infallible.
pub trait View {
    /// Draw one message as a block styled for its role
    fn render_message(&mut self, message: &Message);

    /// Bring the newest message into view
    fn scroll_to_latest(&mut self);

    /// Remove every rendered message
    fn clear_messages(&mut self);

    fn set_status(&mut self, status: Status);

    /// Replace the contents of the input field
    fn set_input(&mut self, text: &str);

    fn set_send_enabled(&mut self, enabled: bool);

    /// Permanently disable the microphone control and relabel it
    fn disable_mic(&mut self, label: &str);

    /// Short transient message outside the transcript
    fn show_notice(&mut self, text: &str);
}

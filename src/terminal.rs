//! Terminal front end
//!
//! Messages go to stdout as `Role: text` blocks. Input is read line by line
//! from stdin and turned into [`UiEvent`]s.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedSender;

use crate::conversation::{Message, Role};
use crate::core::{Status, UiEvent, View};

pub const HELP: &str = "\
Type a question and press Enter. End a line with \\ to continue on the next line.
Commands: /send  /mic  /clear  /quit";

/// Renders the widget on stdout
#[derive(Debug, Default)]
pub struct TerminalView {
    status: Option<Status>,
    send_enabled: bool,
}

impl TerminalView {
    pub fn new() -> Self {
        Self::default()
    }
}

impl View for TerminalView {
    fn render_message(&mut self, message: &Message) {
        let label = match message.role {
            Role::User => "You",
            Role::Assistant => "Assistant",
        };
        println!("{}: {}\n", label, message.text);
    }

    fn scroll_to_latest(&mut self) {
        // The terminal follows its own output
    }

    fn clear_messages(&mut self) {
        print!("\x1B[2J\x1B[H");
    }

    fn set_status(&mut self, status: Status) {
        if self.status != Some(status) {
            println!("[{}]", status);
            self.status = Some(status);
        }
    }

    fn set_input(&mut self, _text: &str) {}

    fn set_send_enabled(&mut self, enabled: bool) {
        if self.send_enabled && !enabled {
            tracing::debug!("Send disabled until the answer arrives");
        }
        self.send_enabled = enabled;
    }

    fn disable_mic(&mut self, label: &str) {
        println!("[mic] {}", label);
    }

    fn show_notice(&mut self, text: &str) {
        println!("({})", text);
    }
}

/// Map one line of terminal input to widget events
pub fn parse_line(line: &str) -> Vec<UiEvent> {
    let line = line.trim_end_matches(['\r', '\n']);

    match line.trim() {
        "/quit" | "/exit" => return vec![UiEvent::Shutdown],
        "/send" => return vec![UiEvent::SendClicked],
        "/mic" => return vec![UiEvent::MicClicked],
        "/clear" => return vec![UiEvent::ClearClicked],
        _ => {}
    }

    // A trailing backslash plays the part of Shift+Enter
    match line.strip_suffix('\\') {
        Some(text) => vec![
            UiEvent::Typed(text.to_string()),
            UiEvent::EnterPressed { shift: true },
        ],
        None => vec![
            UiEvent::Typed(line.to_string()),
            UiEvent::EnterPressed { shift: false },
        ],
    }
}

/// Forward stdin to `events` until `/quit` or end of input, then ask the
/// widget to shut down
pub async fn read_input(events: UnboundedSender<UiEvent>) {
    if let Err(e) = forward_lines(&events).await {
        tracing::error!(error = %e, "Failed to read terminal input");
    }
    let _ = events.send(UiEvent::Shutdown);
}

async fn forward_lines(events: &UnboundedSender<UiEvent>) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        for event in parse_line(&line) {
            if matches!(event, UiEvent::Shutdown) || events.send(event).is_err() {
                return Ok(());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands() {
        assert!(matches!(&parse_line("/quit")[..], [UiEvent::Shutdown]));
        assert!(matches!(&parse_line("/exit")[..], [UiEvent::Shutdown]));
        assert!(matches!(&parse_line(" /mic ")[..], [UiEvent::MicClicked]));
        assert!(matches!(&parse_line("/clear")[..], [UiEvent::ClearClicked]));
        assert!(matches!(&parse_line("/send\r")[..], [UiEvent::SendClicked]));
    }

    #[test]
    fn test_plain_line_submits() {
        match &parse_line("What is bail?")[..] {
            [UiEvent::Typed(text), UiEvent::EnterPressed { shift: false }] => {
                assert_eq!(text, "What is bail?")
            }
            other => panic!("unexpected events: {:?}", other),
        }
    }

    #[test]
    fn test_trailing_backslash_continues() {
        match &parse_line("first line\\")[..] {
            [UiEvent::Typed(text), UiEvent::EnterPressed { shift: true }] => {
                assert_eq!(text, "first line")
            }
            other => panic!("unexpected events: {:?}", other),
        }
    }

    #[test]
    fn test_empty_line_still_presses_enter() {
        match &parse_line("")[..] {
            [UiEvent::Typed(text), UiEvent::EnterPressed { shift: false }] => {
                assert!(text.is_empty())
            }
            other => panic!("unexpected events: {:?}", other),
        }
    }
}

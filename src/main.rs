//! voice-chat - terminal voice chat widget
//!
//! Sends typed or spoken questions to an answer service, shows the reply in
//! a running transcript and reads it aloud.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod conversation;
mod core;
mod service;
mod speech;
mod terminal;

use crate::config::Config;
use crate::core::{ChatWidget, UiEvent};
use crate::service::HttpAnswerClient;
use crate::speech::{CommandRecognizer, CommandSpeaker};
use crate::terminal::TerminalView;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so they stay out of the transcript
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "voice_chat=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env()?;

    let client = HttpAnswerClient::new(config.service_url.clone(), config.request_timeout)?;
    match client.health().await {
        Ok(()) => tracing::info!("Answer service ready at {}", client.base_url()),
        Err(e) => tracing::warn!(
            error = %e,
            "Answer service at {} is not responding, questions may fail",
            client.base_url()
        ),
    }

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();

    let mut widget = ChatWidget::new(TerminalView::new(), Arc::new(client), events_tx.clone())
        .with_voice(config.voice.clone());

    match CommandSpeaker::detect(&config.tts_command) {
        Some(speaker) => widget = widget.with_speech_output(Arc::new(speaker)),
        None if !config.tts_command.is_empty() => {
            tracing::info!("Text-to-speech program {:?} not found", config.tts_command[0])
        }
        None => {}
    }
    match CommandRecognizer::detect(&config.stt_command) {
        Some(recognizer) => widget = widget.with_speech_input(Arc::new(recognizer)),
        None if !config.stt_command.is_empty() => {
            tracing::info!("Speech-to-text program {:?} not found", config.stt_command[0])
        }
        None => {}
    }

    println!("{}\n", terminal::HELP);
    widget.mount(config.greeting.as_deref());

    let reader = tokio::spawn(terminal::read_input(events_tx));

    while let Some(event) = events_rx.recv().await {
        let shutdown = matches!(event, UiEvent::Shutdown);
        widget.handle(event);
        if shutdown {
            break;
        }
    }

    // The stdin reader may be parked on a read that never completes
    reader.abort();
    tracing::info!("👋 Bye");

    Ok(())
}

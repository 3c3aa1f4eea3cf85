//! Speech backed by external programs
//!
//! Commands are argv lists. `{lang}` and `{rate}` inside any argument are
//! replaced with the current [`VoiceOptions`]. A command whose program is not
//! installed is treated as a missing capability.

use std::env;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{SpeechError, SpeechInput, SpeechOutput, VoiceOptions};

/// Text-to-speech through a program such as `espeak-ng` or `say`.
///
/// The text is passed as the last argument. Cancelling kills the child.
/// Nothing here waits on a child; exited ones are collected with `try_wait`
/// on the next `speak` or `cancel_all`.
pub struct CommandSpeaker {
    argv: Vec<String>,
    playback: Mutex<Playback>,
}

#[derive(Default)]
struct Playback {
    current: Option<Child>,
    /// Killed or superseded children that have not been reaped yet
    reaping: Vec<Child>,
}

impl Playback {
    fn reap(&mut self) {
        if let Some(child) = self.current.as_mut() {
            if !matches!(child.try_wait(), Ok(None)) {
                self.current = None;
            }
        }
        self.reaping
            .retain_mut(|child| matches!(child.try_wait(), Ok(None)));
    }
}

impl CommandSpeaker {
    /// Returns `None` when `argv` is empty or its program is not installed
    pub fn detect(argv: &[String]) -> Option<Self> {
        let program = argv.first()?;
        find_program(program)?;
        Some(Self {
            argv: argv.to_vec(),
            playback: Mutex::new(Playback::default()),
        })
    }

    fn playback(&self) -> std::sync::MutexGuard<'_, Playback> {
        self.playback.lock().unwrap_or_else(|e| e.into_inner())
    }

    #[cfg(test)]
    fn is_speaking(&self) -> bool {
        let mut playback = self.playback();
        match playback.current.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }
}

impl SpeechOutput for CommandSpeaker {
    fn speak(&self, text: &str, options: &VoiceOptions) -> Result<(), SpeechError> {
        let argv = expand(&self.argv, options);
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| SpeechError::Failed("empty text-to-speech command".into()))?;

        let mut playback = self.playback();
        playback.reap();
        if let Some(previous) = playback.current.take() {
            // Still playing: the caller chose not to cancel it
            playback.reaping.push(previous);
        }

        let child = Command::new(program)
            .args(args)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        tracing::debug!(pid = child.id(), chars = text.len(), "utterance started");
        playback.current = Some(child);
        Ok(())
    }

    fn cancel_all(&self) {
        let mut playback = self.playback();
        let Playback { current, reaping } = &mut *playback;
        for child in current.iter_mut().chain(reaping.iter_mut()) {
            // Fails only for children that already exited
            let _ = child.kill();
        }
        if let Some(child) = current.take() {
            tracing::debug!(pid = child.id(), "utterance cancelled");
            reaping.push(child);
        }
        playback.reap();
    }
}

impl Drop for CommandSpeaker {
    fn drop(&mut self) {
        self.cancel_all();
        // Killed above, so these waits return promptly
        for child in self.playback().reaping.iter_mut() {
            let _ = child.wait();
        }
    }
}

/// One-shot speech-to-text through a program that listens once and prints
/// what it heard.
///
/// A non-zero exit is a recognition error. Only the last non-empty line of
/// stdout counts, so recognizers may print partial results before it.
pub struct CommandRecognizer {
    argv: Vec<String>,
}

impl CommandRecognizer {
    /// Returns `None` when `argv` is empty or its program is not installed
    pub fn detect(argv: &[String]) -> Option<Self> {
        let program = argv.first()?;
        find_program(program)?;
        Some(Self {
            argv: argv.to_vec(),
        })
    }
}

#[async_trait]
impl SpeechInput for CommandRecognizer {
    async fn start_once(&self, options: &VoiceOptions) -> Result<Option<String>, SpeechError> {
        let argv = expand(&self.argv, options);
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| SpeechError::Failed("empty speech-to-text command".into()))?;

        let output = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SpeechError::Failed(format!(
                "{}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(final_transcript(&String::from_utf8_lossy(&output.stdout)))
    }
}

fn final_transcript(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
        .map(String::from)
}

fn expand(argv: &[String], options: &VoiceOptions) -> Vec<String> {
    let rate = options.rate.to_string();
    argv.iter()
        .map(|arg| arg.replace("{lang}", &options.lang).replace("{rate}", &rate))
        .collect()
}

/// Resolve `program` the way a shell would: paths are checked directly,
/// bare names are searched on `PATH`.
fn find_program(program: &str) -> Option<PathBuf> {
    let path = Path::new(program);
    if path.components().count() > 1 {
        return path.is_file().then(|| path.to_path_buf());
    }

    env::split_paths(&env::var_os("PATH")?)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_expand_placeholders() {
        let options = VoiceOptions {
            lang: "en-IN".into(),
            rate: 1.5,
        };
        let expanded = expand(&argv(&["tts", "--voice={lang}", "-r", "{rate}"]), &options);
        assert_eq!(expanded, argv(&["tts", "--voice=en-IN", "-r", "1.5"]));
    }

    #[test]
    fn test_final_transcript() {
        assert_eq!(
            final_transcript("hel\nhello wor\nhello world\n\n"),
            Some("hello world".to_string())
        );
        assert_eq!(final_transcript("  \n\n"), None);
        assert_eq!(final_transcript(""), None);
    }

    #[test]
    fn test_detect_missing_program() {
        assert!(CommandSpeaker::detect(&[]).is_none());
        assert!(CommandSpeaker::detect(&argv(&["definitely-not-a-real-tts-binary"])).is_none());
        assert!(CommandRecognizer::detect(&argv(&["/nonexistent/dir/stt"])).is_none());
    }

    /// Poll until `done` holds or two seconds pass
    fn eventually(mut done: impl FnMut() -> bool) -> bool {
        for _ in 0..200 {
            if done() {
                return true;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        false
    }

    #[cfg(unix)]
    #[test]
    fn test_cancel_stops_utterance() {
        // `sleep <text>` stands in for a long utterance
        let speaker = CommandSpeaker::detect(&argv(&["sleep"])).unwrap();
        speaker.speak("30", &VoiceOptions::default()).unwrap();
        assert!(speaker.is_speaking());

        speaker.cancel_all();
        assert!(!speaker.is_speaking());

        // The killed child gets collected without a blocking wait
        assert!(eventually(|| {
            let mut playback = speaker.playback();
            playback.reap();
            playback.reaping.is_empty()
        }));
    }

    #[cfg(unix)]
    #[test]
    fn test_speak_leaves_previous_utterance_to_caller() {
        let speaker = CommandSpeaker::detect(&argv(&["sleep"])).unwrap();
        speaker.speak("30", &VoiceOptions::default()).unwrap();
        speaker.speak("30", &VoiceOptions::default()).unwrap();

        {
            let mut playback = speaker.playback();
            assert_eq!(playback.reaping.len(), 1);
            assert!(matches!(playback.reaping[0].try_wait(), Ok(None)));
        }
        assert!(speaker.is_speaking());

        // cancel_all stops both
        speaker.cancel_all();
        assert!(!speaker.is_speaking());
        assert!(eventually(|| {
            let mut playback = speaker.playback();
            playback.reap();
            playback.reaping.is_empty()
        }));
    }

    #[cfg(unix)]
    #[test]
    fn test_finished_utterance_reaped_on_next_speak() {
        let speaker = CommandSpeaker::detect(&argv(&["sleep"])).unwrap();
        speaker.speak("0", &VoiceOptions::default()).unwrap();
        assert!(eventually(|| !speaker.is_speaking()));

        speaker.speak("30", &VoiceOptions::default()).unwrap();
        assert!(speaker.playback().reaping.is_empty());
        assert!(speaker.is_speaking());
        speaker.cancel_all();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_recognizer_takes_last_line() {
        let recognizer =
            CommandRecognizer::detect(&argv(&["sh", "-c", "printf 'hel\\nhello {lang}\\n'"])).unwrap();
        let text = recognizer.start_once(&VoiceOptions::default()).await.unwrap();
        assert_eq!(text, Some("hello en-IN".to_string()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_recognizer_silence() {
        let recognizer = CommandRecognizer::detect(&argv(&["sh", "-c", "true"])).unwrap();
        let text = recognizer.start_once(&VoiceOptions::default()).await.unwrap();
        assert_eq!(text, None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_recognizer_failure() {
        let recognizer =
            CommandRecognizer::detect(&argv(&["sh", "-c", "echo 'no microphone' >&2; exit 3"]))
                .unwrap();
        let err = recognizer
            .start_once(&VoiceOptions::default())
            .await
            .unwrap_err();
        match err {
            SpeechError::Failed(msg) => assert!(msg.contains("no microphone")),
            other => panic!("unexpected error: {other}"),
        }
    }
}

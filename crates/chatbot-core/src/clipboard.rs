use anyhow::{anyhow, Result};
use std::io::Write;
use std::process::{Command, Stdio};

use crate::transcript::Transcript;

pub trait Clipboard {
    fn write_text(&mut self, text: &str) -> Result<()>;
}

/// Pipes text into whichever platform clipboard command is installed.
#[derive(Debug, Clone, Default)]
pub struct SystemClipboard;

const COMMANDS: &[(&str, &[&str])] = &[
    ("pbcopy", &[]),
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("clip", &[]),
];

impl SystemClipboard {
    fn pipe_into(program: &str, args: &[&str], text: &str) -> Result<()> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        let written = match child.stdin.take() {
            // stdin is dropped at the end of this arm so the command sees EOF
            Some(mut stdin) => stdin.write_all(text.as_bytes()),
            None => Ok(()),
        };
        if let Err(e) = written {
            let _ = child.kill();
            let _ = child.wait();
            return Err(e.into());
        }

        let status = child.wait()?;
        if !status.success() {
            return Err(anyhow!("{} exited with {}", program, status));
        }
        Ok(())
    }
}

impl Clipboard for SystemClipboard {
    fn write_text(&mut self, text: &str) -> Result<()> {
        let mut last_error = anyhow!("no clipboard command available");
        for (program, args) in COMMANDS {
            match Self::pipe_into(program, args, text) {
                Ok(()) => return Ok(()),
                Err(e) => last_error = e,
            }
        }
        Err(last_error)
    }
}

/// Copy the last bot answer in `transcript`. Returns whether anything was written.
pub fn copy_response(transcript: &Transcript, clipboard: &mut dyn Clipboard) -> bool {
    let Some(text) = transcript.last_bot_segment() else {
        return false;
    };

    match clipboard.write_text(&text) {
        Ok(()) => {
            tracing::info!("response copied to clipboard");
            true
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to copy response");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingClipboard {
        writes: Vec<String>,
    }

    impl Clipboard for RecordingClipboard {
        fn write_text(&mut self, text: &str) -> Result<()> {
            self.writes.push(text.to_string());
            Ok(())
        }
    }

    struct BrokenClipboard;

    impl Clipboard for BrokenClipboard {
        fn write_text(&mut self, _text: &str) -> Result<()> {
            Err(anyhow!("no display"))
        }
    }

    #[test]
    fn test_copy_without_bot_line_writes_nothing() {
        let mut clipboard = RecordingClipboard::default();
        let mut transcript = Transcript::new();
        transcript.show_question("Hello");

        assert!(!copy_response(&transcript, &mut clipboard));
        assert!(clipboard.writes.is_empty());
    }

    #[test]
    fn test_copy_writes_bot_segment() {
        let mut clipboard = RecordingClipboard::default();
        let mut transcript = Transcript::new();
        transcript.show_exchange("Hello", "Hi\nthere");

        assert!(copy_response(&transcript, &mut clipboard));
        assert_eq!(clipboard.writes, vec!["Hi\nthere".to_string()]);
    }

    #[cfg(unix)]
    #[test]
    fn test_pipe_into_reaps_child_when_write_fails() {
        // `true` exits without reading, so a large write hits a broken pipe
        let text = "x".repeat(4 * 1024 * 1024);
        let err = SystemClipboard::pipe_into("true", &[], &text).unwrap_err();
        let io_err = err.downcast_ref::<std::io::Error>().unwrap();
        assert_eq!(io_err.kind(), std::io::ErrorKind::BrokenPipe);
    }

    #[cfg(unix)]
    #[test]
    fn test_pipe_into_reports_exit_status() {
        let err = SystemClipboard::pipe_into("false", &[], "hi").unwrap_err();
        assert!(err.to_string().contains("false exited with"));
    }

    #[test]
    fn test_copy_failure_reports_false() {
        let mut transcript = Transcript::new();
        transcript.show_exchange("Hello", "Hi");
        assert!(!copy_response(&transcript, &mut BrokenClipboard));
    }
}

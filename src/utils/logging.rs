use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing_subscriber::EnvFilter;

use crate::core::constants::LOG_ENV;
use crate::core::error::RenderError;
use crate::core::message::Message;

/// Installs the stderr `tracing` subscriber. `MARKSTREAM_LOG` overrides the
/// default level. Returns false if a subscriber was already installed.
pub fn init_tracing(verbose: bool) -> bool {
    let fallback = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok()
}

/// Appends completed messages to a plain-text transcript file.
#[derive(Debug, Default)]
pub struct TranscriptLog {
    file_path: Option<PathBuf>,
    is_active: bool,
}

impl TranscriptLog {
    pub fn new(log_file: Option<PathBuf>) -> Self {
        let is_active = log_file.is_some();
        TranscriptLog {
            file_path: log_file,
            is_active,
        }
    }

    pub fn set_log_file(&mut self, path: PathBuf) -> Result<String, RenderError> {
        // Fail early if the file cannot be created
        OpenOptions::new().create(true).append(true).open(&path)?;

        let message = format!("Logging enabled to: {}", path.display());
        self.file_path = Some(path);
        self.is_active = true;
        Ok(message)
    }

    pub fn toggle_logging(&mut self) -> Result<String, RenderError> {
        match &self.file_path {
            Some(path) => {
                self.is_active = !self.is_active;
                Ok(if self.is_active {
                    format!("Logging resumed to: {}", path.display())
                } else {
                    format!("Logging paused (file: {})", path.display())
                })
            }
            None => Err(RenderError::Config("no transcript log file set".to_string())),
        }
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Writes one message, prefixed with its kind, followed by a blank line.
    pub fn log_message(&self, message: &Message) -> Result<(), RenderError> {
        let Some(path) = self.file_path.as_deref().filter(|_| self.is_active) else {
            return Ok(());
        };
        write_entry(path, message)
    }

    pub fn get_status_string(&self) -> String {
        let name = |path: &Path| {
            path.file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .into_owned()
        };
        match (&self.file_path, self.is_active) {
            (None, _) => "disabled".to_string(),
            (Some(path), true) => format!("active ({})", name(path)),
            (Some(path), false) => format!("paused ({})", name(path)),
        }
    }
}

fn write_entry(path: &Path, message: &Message) -> Result<(), RenderError> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = BufWriter::with_capacity(64 * 1024, file);

    writeln!(writer, "[{}]", message.kind)?;
    for line in message.content.lines() {
        writeln!(writer, "{line}")?;
    }
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn log_appends_messages_with_kind_headers() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("transcript.log");
        let log = TranscriptLog::new(Some(path.clone()));

        log.log_message(&Message::user("hi")).unwrap();
        log.log_message(&Message::assistant("line one\nline two"))
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "[user]\nhi\n\n[assistant]\nline one\nline two\n\n"
        );
    }

    #[test]
    fn paused_log_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("transcript.log");
        let mut log = TranscriptLog::default();
        log.set_log_file(path.clone()).unwrap();
        let status = log.toggle_logging().unwrap();
        assert!(status.starts_with("Logging paused"));
        assert_eq!(log.get_status_string(), "paused (transcript.log)");

        log.log_message(&Message::user("ignored")).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn toggling_without_file_is_an_error() {
        let mut log = TranscriptLog::default();
        assert!(log.toggle_logging().is_err());
        assert_eq!(log.get_status_string(), "disabled");
    }
}

// Container log entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStream {
    Stdout,
    Stderr,
}

impl LogStream {
    /// Frame header selector byte: 2 is stderr, anything else stdout.
    pub fn from_selector(byte: u8) -> Self {
        match byte {
            2 => LogStream::Stderr,
            _ => LogStream::Stdout,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub stream: LogStream,
}

impl LogEntry {
    /// `[2006-01-02T15:04:05Z] message` line used by the logs endpoint.
    pub fn display_line(&self) -> String {
        format!(
            "[{}] {}",
            self.timestamp.format("%Y-%m-%dT%H:%M:%SZ"),
            self.message
        )
    }
}

use std::fmt;

use serde::{Deserialize, Serialize};

/// One parsed log line.
/// Immutable once built by the event parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    pub timestamp: String,
    pub source: String,
    pub level: String,
    pub message: String,
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}: {}",
            self.timestamp, self.source, self.level, self.message
        )
    }
}

/// Result of parsing a whole log document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedLog {
    pub events: Vec<LogEvent>,
    pub total_lines: usize,
    pub skipped_lines: usize,
}

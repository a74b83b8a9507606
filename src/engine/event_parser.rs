use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::model::log_event::{LogEvent, ParsedLog};

// <ISO-8601 timestamp> [<source tag>] <LEVEL>: <message>
static LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}:\d{2}(?:[.,]\d+)?(?:Z|[+-]\d{2}:?\d{2})?)\s+\[([^\]]+)\]\s+([A-Za-z]+):\s*(.*)$",
    )
    .expect("log line pattern is valid")
});

static INTENT_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Intent ID:\s*(\d+)").expect("intent id pattern is valid"));

static INTENT_TEXT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"Intent ID:\s*(\d+)\s+-\s+"([^"]*)""#).expect("intent text pattern is valid")
});

static ADAPTATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Adaptation for Intent ID:\s*(\d+)\s+-\s+(.*\S)").expect("adaptation pattern is valid")
});

/// Parses a single log line. Never fails: anything that does not carry
/// all four fields is `None`.
pub fn parse(line: &str) -> Option<LogEvent> {
    let caps = LINE_RE.captures(line.trim_end_matches(['\r', '\n']))?;

    let message = caps[4].trim_end();
    if message.is_empty() {
        return None;
    }

    Some(LogEvent {
        timestamp: caps[1].to_string(),
        source: caps[2].trim().to_string(),
        level: caps[3].to_string(),
        message: message.to_string(),
    })
}

/// Parses every line of a closed log document, counting the lines dropped.
pub fn parse_log(text: &str) -> ParsedLog {
    let mut parsed = ParsedLog::default();

    for (idx, line) in text.lines().enumerate() {
        parsed.total_lines += 1;

        match parse(line) {
            Some(event) => parsed.events.push(event),
            None => {
                parsed.skipped_lines += 1;
                debug!(line_number = idx + 1, "skipping unrecognized log line");
            }
        }
    }

    parsed
}

/// Numeric id following `Intent ID:`.
pub fn extract_intent_id(line: &str) -> Option<String> {
    INTENT_ID_RE
        .captures(line)
        .map(|caps| caps[1].to_string())
}

/// Every id named by an `Intent ID:` marker, in order of appearance.
pub fn extract_intent_ids(line: &str) -> Vec<String> {
    INTENT_ID_RE
        .captures_iter(line)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Id and quoted text of an intent-received line, taken from one match:
/// `Intent ID: <id> - "..."`.
pub fn extract_intent(line: &str) -> Option<(String, String)> {
    INTENT_TEXT_RE
        .captures(line)
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
}

/// Id and free text following `Adaptation for Intent ID: <id> - `,
/// taken from one match.
pub fn extract_adaptation(line: &str) -> Option<(String, String)> {
    ADAPTATION_RE
        .captures(line)
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
}

pub fn extract_intent_text(line: &str) -> Option<String> {
    extract_intent(line).map(|(_, text)| text)
}

pub fn extract_adaptation_text(line: &str) -> Option<String> {
    extract_adaptation(line).map(|(_, text)| text)
}

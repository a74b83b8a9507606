use crate::config::settings::ReportStyle;
use crate::engine::event_parser::extract_intent_ids;
use crate::model::intent_record::IntentRecord;
use crate::model::log_event::LogEvent;
use crate::model::message::PromptMessage;

const DECISION_PROMPT: &str = "Explain the decision made in the following context:";
const FOCUS_PROMPT: &str = "Explain the adaptations made for Intent ID:";
const MISSING_INTENT_TEXT: &str = "(intent text not recorded)";

/// Builds the ordered message sequence sent to a generation backend.
/// This struct only formats text: it never truncates or summarizes.
/// Choosing the contributing lines is the caller's job.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    use_case_context: String,
    instruction: String,
}

impl PromptBuilder {
    pub fn new(use_case_context: impl Into<String>, instruction: impl Into<String>) -> Self {
        Self {
            use_case_context: use_case_context.into(),
            instruction: instruction.into(),
        }
    }

    pub fn system_message(&self) -> PromptMessage {
        PromptMessage::system(format!(
            "{}\n\n{}",
            self.use_case_context, self.instruction
        ))
    }

    /// One system message, then one user message per line in the order given.
    pub fn build<S: AsRef<str>>(&self, contributing_lines: &[S]) -> Vec<PromptMessage> {
        let mut messages = Vec::with_capacity(contributing_lines.len() + 1);
        messages.push(self.system_message());
        messages.extend(
            contributing_lines
                .iter()
                .map(|line| PromptMessage::user(line.as_ref())),
        );
        messages
    }

    pub fn build_for_intent(
        &self,
        style: ReportStyle,
        record: &IntentRecord,
        events: &[LogEvent],
    ) -> Vec<PromptMessage> {
        self.build(&contributing_lines(style, record, events))
    }
}

/// Lines that feed the prompt for one intent.
pub fn contributing_lines(
    style: ReportStyle,
    record: &IntentRecord,
    events: &[LogEvent],
) -> Vec<String> {
    match style {
        ReportStyle::Transcript => transcript_lines(&record.id, events),
        ReportStyle::Summary => vec![summarize_intent(record)],
        ReportStyle::FullLog => full_log_lines(&record.id, events),
    }
}

/// The whole parsed log in order, closed by a line naming the intent to explain.
pub fn full_log_lines(id: &str, events: &[LogEvent]) -> Vec<String> {
    let mut lines: Vec<String> = events.iter().map(LogEvent::to_string).collect();
    lines.push(format!("{} {}", FOCUS_PROMPT, id));
    lines
}

/// Raw log lines mentioning `id`, in log order.
pub fn transcript_lines(id: &str, events: &[LogEvent]) -> Vec<String> {
    events
        .iter()
        .filter(|event| extract_intent_ids(&event.message).iter().any(|named| named == id))
        .map(LogEvent::to_string)
        .collect()
}

pub fn summarize_intent(record: &IntentRecord) -> String {
    let text = record.text.as_deref().unwrap_or(MISSING_INTENT_TEXT);

    let adaptations = if record.adaptations.is_empty() {
        "no recorded adaptations".to_string()
    } else {
        record.adaptations.join("; ")
    };

    format!(
        "Intent ID: {} - \"{}\". Adaptations: {}",
        record.id, text, adaptations
    )
}

/// Single-message request for an ad-hoc decision context.
pub fn decision_prompt(decision_context: &str) -> Vec<PromptMessage> {
    vec![PromptMessage::user(format!(
        "{} {}",
        DECISION_PROMPT, decision_context
    ))]
}

use tracing::{debug, warn};

use crate::engine::event_parser::{extract_adaptation, extract_intent};
use crate::model::intent_record::CorrelationTable;
use crate::model::log_event::LogEvent;

/// What a single event means to the correlator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentEvent {
    Received { id: String, text: String },
    Adaptation { id: String, text: String },
}

/// Classifies an event. Adaptation lines also contain `Intent ID:`,
/// so they are matched first. The id always comes from the same match
/// as the text it belongs to.
pub fn classify(event: &LogEvent) -> Option<IntentEvent> {
    let message = &event.message;

    if let Some((id, text)) = extract_adaptation(message) {
        return Some(IntentEvent::Adaptation { id, text });
    }

    extract_intent(message).map(|(id, text)| IntentEvent::Received { id, text })
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Correlation {
    pub table: CorrelationTable,

    /// Ids first seen through an adaptation, in first-seen order
    pub unknown_references: Vec<String>,
}

/// Groups adaptations under their owning intent, in the order supplied.
pub fn correlate(events: &[LogEvent]) -> CorrelationTable {
    correlate_with_diagnostics(events).table
}

pub fn correlate_with_diagnostics(events: &[LogEvent]) -> Correlation {
    let mut out = Correlation::default();

    for event in events {
        match classify(event) {
            Some(IntentEvent::Received { id, text }) => {
                let (record, created) = out.table.entry(&id);
                // Replayed intent lines overwrite earlier text (last write wins).
                if !created {
                    if let Some(previous) = record.text.as_deref() {
                        if previous != text {
                            warn!(intent_id = %id, previous, current = %text, "intent text overwritten");
                        }
                    }
                }
                record.text = Some(text);
            }

            Some(IntentEvent::Adaptation { id, text }) => {
                let (record, created) = out.table.entry(&id);
                if created {
                    warn!(intent_id = %id, "adaptation references an intent not yet seen");
                    out.unknown_references.push(id.clone());
                }
                record.adaptations.push(text);
            }

            None => debug!(source = %event.source, "event carries no intent data"),
        }
    }

    // An intent line arriving after its adaptations resolves the placeholder.
    out.unknown_references
        .retain(|id| out.table.get(id).is_some_and(|r| r.is_placeholder()));

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::event_parser::parse;

    fn events(lines: &[&str]) -> Vec<LogEvent> {
        lines.iter().filter_map(|l| parse(l)).collect()
    }

    fn intent(ts: &str, id: &str, text: &str) -> String {
        format!(r#"2024-03-01T10:{ts}Z [intent-manager] INFO: Intent received: Intent ID: {id} - "{text}""#)
    }

    fn adaptation(ts: &str, id: &str, text: &str) -> String {
        format!("2024-03-01T10:{ts}Z [adapter] INFO: Adaptation for Intent ID: {id} - {text}")
    }

    #[test]
    fn groups_adaptation_under_its_intent() {
        let lines = [
            intent("00:00", "001", "Reduce energy by 20%"),
            adaptation("05:00", "001", "Energy reduced by 15%"),
        ];
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let table = correlate(&events(&refs));

        assert_eq!(table.len(), 1);
        let record = table.get("001").unwrap();
        assert_eq!(record.text.as_deref(), Some("Reduce energy by 20%"));
        assert_eq!(record.adaptations, vec!["Energy reduced by 15%"]);
    }

    #[test]
    fn unknown_reference_creates_placeholder() {
        let line = adaptation("00:00", "099", "Scaled out web tier");
        let out = correlate_with_diagnostics(&events(&[&line]));

        let record = out.table.get("099").unwrap();
        assert!(record.text.is_none());
        assert_eq!(record.adaptations, vec!["Scaled out web tier"]);
        assert_eq!(out.unknown_references, vec!["099"]);
    }

    #[test]
    fn late_intent_line_fills_placeholder_text() {
        let lines = [
            adaptation("00:00", "007", "Cache warmed"),
            intent("01:00", "007", "Lower latency"),
            adaptation("02:00", "007", "Replica added"),
        ];
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let out = correlate_with_diagnostics(&events(&refs));

        let record = out.table.get("007").unwrap();
        assert_eq!(record.text.as_deref(), Some("Lower latency"));
        assert_eq!(record.adaptations, vec!["Cache warmed", "Replica added"]);
        assert!(out.unknown_references.is_empty());
    }

    #[test]
    fn repeated_intent_line_keeps_last_text_and_adaptations() {
        let lines = [
            intent("00:00", "002", "first"),
            adaptation("01:00", "002", "a1"),
            intent("02:00", "002", "second"),
        ];
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let table = correlate(&events(&refs));

        let record = table.get("002").unwrap();
        assert_eq!(record.text.as_deref(), Some("second"));
        assert_eq!(record.adaptations, vec!["a1"]);
    }

    #[test]
    fn preserves_log_order_not_id_order() {
        let lines = [
            intent("00:00", "010", "ten"),
            intent("00:01", "002", "two"),
            adaptation("00:02", "002", "x"),
            adaptation("00:03", "010", "y"),
            adaptation("00:04", "002", "z"),
        ];
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let table = correlate(&events(&refs));

        assert_eq!(table.ids().collect::<Vec<_>>(), vec!["010", "002"]);
        assert_eq!(table.get("002").unwrap().adaptations, vec!["x", "z"]);
    }

    #[test]
    fn ignores_unrelated_events() {
        let lines = [
            "2024-03-01T10:00:00Z [monitor] INFO: cpu at 40%".to_string(),
            "2024-03-01T10:00:01Z [monitor] ERROR: Intent ID: 5 lost".to_string(),
        ];
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        assert!(correlate(&events(&refs)).is_empty());
    }

    #[test]
    fn adaptation_attaches_to_the_id_it_names() {
        let lines = [
            intent("00:00", "4", "Absorb peak load"),
            "2024-03-01T10:01:00Z [adapter] INFO: Intent ID: 3 escalated; Adaptation for Intent ID: 4 - Scaled out"
                .to_string(),
        ];
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let out = correlate_with_diagnostics(&events(&refs));

        assert_eq!(out.table.ids().collect::<Vec<_>>(), vec!["4"]);
        assert_eq!(out.table.get("4").unwrap().adaptations, vec!["Scaled out"]);
        assert!(out.unknown_references.is_empty());
    }

    #[test]
    fn is_deterministic() {
        let lines = [
            adaptation("00:00", "3", "c"),
            intent("00:01", "1", "a"),
            adaptation("00:02", "1", "b"),
            intent("00:03", "2", "d"),
        ];
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let evs = events(&refs);

        let first = serde_json::to_string(&correlate(&evs)).unwrap();
        let second = serde_json::to_string(&correlate(&evs)).unwrap();
        assert_eq!(first, second);
    }
}

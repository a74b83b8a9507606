use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub title: String,
    pub sections: Vec<ReportSection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSection {
    pub intent_id: String,

    /// Empty when the intent text was never recorded
    pub intent_text: String,
    pub adaptation_texts: Vec<String>,
    pub narrative: String,
}

/// Lines the parser or correlator dropped or patched up.
/// None of these are failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub total_lines: usize,
    pub parsed_events: usize,
    pub skipped_lines: usize,
    pub unknown_intent_references: Vec<String>,
}

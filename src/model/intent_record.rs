use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentRecord {
    pub id: String,

    /// None until an "intent received" line supplies it
    pub text: Option<String>,

    /// In the order observed in the log
    pub adaptations: Vec<String>,
}

impl IntentRecord {
    pub fn new(id: &str, text: Option<String>) -> Self {
        Self {
            id: id.to_string(),
            text,
            adaptations: Vec::new(),
        }
    }

    /// Created by an adaptation that referenced an id never seen as an intent.
    pub fn is_placeholder(&self) -> bool {
        self.text.is_none()
    }
}

/// Intent id → record, iterated in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationTable {
    records: IndexMap<String, IntentRecord>,
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&IntentRecord> {
        self.records.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn records(&self) -> impl Iterator<Item = &IntentRecord> {
        self.records.values()
    }

    pub fn placeholders(&self) -> impl Iterator<Item = &IntentRecord> {
        self.records.values().filter(|r| r.is_placeholder())
    }

    pub(crate) fn entry(&mut self, id: &str) -> (&mut IntentRecord, bool) {
        let created = !self.records.contains_key(id);
        let record = self
            .records
            .entry(id.to_string())
            .or_insert_with(|| IntentRecord::new(id, None));
        (record, created)
    }
}

use crate::error::GenerationError;
use crate::model::message::PromptMessage;

/// Work handed to a generation worker.
#[derive(Debug, Clone)]
pub struct GenerationJob {
    pub intent_id: String,
    pub messages: Vec<PromptMessage>,
}

/// What a worker sends back for one job.
#[derive(Debug)]
pub struct GenerationOutcome {
    pub intent_id: String,
    pub result: Result<String, GenerationError>,
}

pub mod intent_record;
pub mod log_event;
pub mod message;
pub mod report;

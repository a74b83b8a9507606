//! Explains what an adaptive system did in response to each intent,
//! by correlating its operational log and asking a text-generation
//! backend for a narrative per intent.

pub mod config;
pub mod engine;
pub mod error;
pub mod model;

pub use config::settings::{BackendKind, ReportStyle, Settings};
pub use engine::llm_client::{GenerationClient, LlmClient};
pub use engine::pipeline::{explain_decision, explain_log_file, explain_log_text, Explanation};
pub use error::{ConfigError, ExplainError, GenerationError};

pub mod correlator;
pub mod event_parser;
pub mod llm_client;
pub mod narrative_parser;
pub mod pipeline;
pub mod prompt_builder;
pub mod protocol;
pub mod report_renderer;
pub mod worker;

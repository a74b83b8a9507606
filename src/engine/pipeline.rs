use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::config::settings::Settings;
use crate::engine::correlator::correlate_with_diagnostics;
use crate::engine::event_parser::parse_log;
use crate::engine::llm_client::GenerationClient;
use crate::engine::prompt_builder::{decision_prompt, PromptBuilder};
use crate::engine::protocol::GenerationJob;
use crate::engine::report_renderer::{render_html, ReportRenderer};
use crate::engine::worker::generate_narratives;
use crate::error::{ExplainError, GenerationError};
use crate::model::report::{Diagnostics, Report};

/// Everything one run produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Explanation {
    pub report: Report,
    pub html: String,
    pub diagnostics: Diagnostics,
}

/// Reads the whole log once, then explains it.
pub fn explain_log_file(
    settings: &Settings,
    path: &Path,
    client: &dyn GenerationClient,
) -> Result<Explanation, ExplainError> {
    settings.validate()?;

    let text = fs::read_to_string(path).map_err(|source| ExplainError::ReadLog {
        path: path.to_path_buf(),
        source,
    })?;

    info!(path = %path.display(), bytes = text.len(), "log loaded");
    explain_validated(settings, &text, client)
}

/// parse → correlate → build prompts → generate → render.
pub fn explain_log_text(
    settings: &Settings,
    text: &str,
    client: &dyn GenerationClient,
) -> Result<Explanation, ExplainError> {
    settings.validate()?;
    explain_validated(settings, text, client)
}

fn explain_validated(
    settings: &Settings,
    text: &str,
    client: &dyn GenerationClient,
) -> Result<Explanation, ExplainError> {
    let parsed = parse_log(text);
    let correlation = correlate_with_diagnostics(&parsed.events);
    let table = &correlation.table;

    let diagnostics = Diagnostics {
        total_lines: parsed.total_lines,
        parsed_events: parsed.events.len(),
        skipped_lines: parsed.skipped_lines,
        unknown_intent_references: correlation.unknown_references.clone(),
    };

    info!(
        lines = diagnostics.total_lines,
        skipped = diagnostics.skipped_lines,
        intents = table.len(),
        placeholders = diagnostics.unknown_intent_references.len(),
        "log correlated"
    );
    if diagnostics.skipped_lines > 0 {
        warn!(skipped = diagnostics.skipped_lines, "some log lines were not recognized");
    }

    let builder = PromptBuilder::new(&settings.use_case_context, &settings.system_prompt);
    let jobs = table
        .records()
        .map(|record| GenerationJob {
            intent_id: record.id.clone(),
            messages: builder.build_for_intent(settings.report_style, record, &parsed.events),
        })
        .collect();

    let mut narratives = generate_narratives(client, jobs, settings.max_concurrency)
        .map_err(|(intent_id, source)| ExplainError::Generation { intent_id, source })?;

    let report = ReportRenderer::new(&settings.report_title).render(table, |id| {
        narratives
            .remove(id)
            .ok_or_else(|| ExplainError::Generation {
                intent_id: id.to_string(),
                source: GenerationError::Unavailable("no narrative was produced".into()),
            })
    })?;

    let html = render_html(&report);
    info!(sections = report.sections.len(), "report rendered");

    Ok(Explanation {
        report,
        html,
        diagnostics,
    })
}

/// Explains a single free-form decision context.
pub fn explain_decision(
    client: &dyn GenerationClient,
    decision_context: &str,
) -> Result<String, GenerationError> {
    client.generate(&decision_prompt(decision_context))
}

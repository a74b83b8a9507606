use crate::engine::narrative_parser::{parse_narrative, NarrativeBlock};
use crate::model::intent_record::CorrelationTable;
use crate::model::report::{Report, ReportSection};

pub struct ReportRenderer {
    title: String,
}

impl ReportRenderer {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    /// One section per record, in table order. The first narrative failure
    /// aborts the whole report.
    pub fn render<F, E>(&self, table: &CorrelationTable, mut narrative_for: F) -> Result<Report, E>
    where
        F: FnMut(&str) -> Result<String, E>,
    {
        let mut sections = Vec::with_capacity(table.len());

        for record in table.records() {
            let narrative = narrative_for(&record.id)?;
            sections.push(ReportSection {
                intent_id: record.id.clone(),
                intent_text: record.text.clone().unwrap_or_default(),
                adaptation_texts: record.adaptations.clone(),
                narrative,
            });
        }

        Ok(Report {
            title: self.title.clone(),
            sections,
        })
    }
}

/// Escapes the characters that are significant in HTML text and attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders a complete HTML document. Every piece of log or backend text
/// goes through `escape_html`.
pub fn render_html(report: &Report) -> String {
    let mut html = String::new();
    let title = escape_html(&report.title);

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{title}</title>\n"));
    html.push_str("</head>\n<body>\n");
    html.push_str(&format!("<h1>{title}</h1>\n"));

    if report.sections.is_empty() {
        html.push_str("<p>No intents found in the log.</p>\n");
    }

    for section in &report.sections {
        push_section(&mut html, section);
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn push_section(html: &mut String, section: &ReportSection) {
    html.push_str(&format!(
        "<section class=\"intent\" id=\"intent-{}\">\n",
        escape_html(&section.intent_id)
    ));
    html.push_str(&format!(
        "<h2>Intent ID: {}</h2>\n",
        escape_html(&section.intent_id)
    ));
    html.push_str(&format!(
        "<p class=\"intent-text\">{}</p>\n",
        escape_html(&section.intent_text)
    ));

    html.push_str("<h3>Adaptations</h3>\n<ul class=\"adaptations\">\n");
    if section.adaptation_texts.is_empty() {
        html.push_str("<li class=\"empty\">No adaptations recorded</li>\n");
    }
    for adaptation in &section.adaptation_texts {
        html.push_str(&format!("<li>{}</li>\n", escape_html(adaptation)));
    }
    html.push_str("</ul>\n");

    html.push_str("<h3>Explanation</h3>\n<div class=\"narrative\">\n");
    push_narrative(html, &section.narrative);
    html.push_str("</div>\n</section>\n");
}

fn push_narrative(html: &mut String, narrative: &str) {
    let mut in_list = false;

    for block in parse_narrative(narrative) {
        match block {
            NarrativeBlock::Bullet(text) => {
                if !in_list {
                    html.push_str("<ul>\n");
                    in_list = true;
                }
                html.push_str(&format!("<li>{}</li>\n", escape_html(&text)));
            }
            NarrativeBlock::Paragraph(text) => {
                if in_list {
                    html.push_str("</ul>\n");
                    in_list = false;
                }
                html.push_str(&format!("<p>{}</p>\n", escape_html(&text)));
            }
        }
    }

    if in_list {
        html.push_str("</ul>\n");
    }
}

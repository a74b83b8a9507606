/// A display unit of generated narrative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NarrativeBlock {
    Paragraph(String),
    Bullet(String),
}

/// Splits backend output into paragraphs and bullet items.
/// Consecutive plain lines form one paragraph; a blank line ends it.
pub fn parse_narrative(narrative: &str) -> Vec<NarrativeBlock> {
    let mut blocks = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();

    for line in narrative.lines() {
        let line = line.trim();

        if line.is_empty() {
            flush(&mut blocks, &mut paragraph);
            continue;
        }

        // - item / * item
        if let Some(rest) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
            flush(&mut blocks, &mut paragraph);
            blocks.push(NarrativeBlock::Bullet(rest.trim().to_string()));
            continue;
        }

        paragraph.push(line);
    }

    flush(&mut blocks, &mut paragraph);
    blocks
}

fn flush(blocks: &mut Vec<NarrativeBlock>, paragraph: &mut Vec<&str>) {
    if !paragraph.is_empty() {
        blocks.push(NarrativeBlock::Paragraph(paragraph.join(" ")));
        paragraph.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_wrapped_lines_and_splits_on_blank() {
        let blocks = parse_narrative("The system saw\nhigh load.\n\nIt scaled out.");
        assert_eq!(
            blocks,
            vec![
                NarrativeBlock::Paragraph("The system saw high load.".into()),
                NarrativeBlock::Paragraph("It scaled out.".into()),
            ]
        );
    }

    #[test]
    fn recognizes_bullets() {
        let blocks = parse_narrative("Steps:\n- dimmed lights\n* paused batch jobs\nDone.");
        assert_eq!(
            blocks,
            vec![
                NarrativeBlock::Paragraph("Steps:".into()),
                NarrativeBlock::Bullet("dimmed lights".into()),
                NarrativeBlock::Bullet("paused batch jobs".into()),
                NarrativeBlock::Paragraph("Done.".into()),
            ]
        );
    }

    #[test]
    fn empty_narrative_has_no_blocks() {
        assert!(parse_narrative("  \n\n").is_empty());
    }
}

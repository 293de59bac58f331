//! Tab-separated text report covering one mining run.

use std::collections::BTreeSet;

use crate::model::{Pattern, PatternKind};

/// Renders the report written next to an exported project.
///
/// The header repeats the project name per line so the rows stay
/// greppable across projects; `row_count` and `column_count` describe
/// the mined view, and `seconds` is the measured mining time (printed
/// as a bare `0` when nothing was found).
pub fn render(
    project_name: &str,
    patterns: &[Pattern],
    row_count: usize,
    column_count: usize,
    seconds: f64,
) -> String {
    let mut births = 0usize;
    let mut deaths = 0usize;
    let mut updates = 0usize;
    let mut ladders = 0usize;
    let mut entities: BTreeSet<&str> = BTreeSet::new();
    let mut phases: BTreeSet<u32> = BTreeSet::new();

    let mut blocks = String::new();
    for pattern in patterns {
        match pattern.kind {
            PatternKind::MultipleBirths => births += 1,
            PatternKind::MultipleDeaths => deaths += 1,
            PatternKind::MultipleUpdates => updates += 1,
            PatternKind::Ladder => ladders += 1,
        }
        blocks.push_str(pattern.kind.label());
        blocks.push('\n');
        if !pattern.cells.is_empty() {
            blocks.push_str(&format!(
                "The pattern consists of {} cells\n",
                pattern.cells.len()
            ));
            for cell in &pattern.cells {
                entities.insert(cell.entity_name.as_str());
                phases.insert(cell.phase.as_raw());
                blocks.push_str(&format!(
                    "Entity Name : {} PhaseId: {}\n",
                    cell.entity_name,
                    cell.phase.as_raw()
                ));
            }
        }
        blocks.push('\n');
    }

    let mut out = String::new();
    out.push_str(&format!("Project Name:\t{project_name}\n"));
    out.push_str(&format!(
        "{project_name}\tNumber of columns:\t{column_count}\n"
    ));
    out.push_str(&format!("{project_name}\tNumber of rows:\t{row_count}\n"));
    out.push_str(&format!(
        "{project_name}\tNumber of columns that participate in patterns:\t{}\n",
        phases.len()
    ));
    out.push_str(&format!(
        "{project_name}\tNumber of rows that participate in patterns:\t{}\n",
        entities.len()
    ));
    out.push_str(&format!(
        "{project_name}\tNumber of total patterns:\t{}\n",
        patterns.len()
    ));
    out.push_str(&format!(
        "{project_name}\tNumber of births patterns:\t{births}\n"
    ));
    out.push_str(&format!(
        "{project_name}\tNumber of deaths patterns:\t{deaths}\n"
    ));
    out.push_str(&format!(
        "{project_name}\tNumber of updates patterns:\t{updates}\n"
    ));
    out.push_str(&format!(
        "{project_name}\tNumber of ladder patterns:\t{ladders}\n"
    ));
    if patterns.is_empty() {
        out.push_str(&format!("{project_name}\tPatterns computation(sec):\t0\n"));
    } else {
        out.push_str(&format!(
            "{project_name}\tPatterns computation(sec):\t{seconds}\n"
        ));
    }
    out.push('\n');
    out.push_str(&blocks);
    out
}

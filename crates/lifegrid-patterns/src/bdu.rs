//! Per-phase synchronized birth, update, and death buckets.

use lifegrid_cluster::Phase;
use lifegrid_grid::{cell_state, CellState, GridView};

use crate::model::{Pattern, PatternCell, PatternKind};

/// Scans every phase and emits one pattern per bucket whose size
/// strictly exceeds `threshold`.
///
/// Rows are bucketed by their lifecycle state against the phase; "update"
/// additionally requires a non-empty cell in the view at that phase.
/// Emission per phase is births, then updates, then deaths, each cell
/// naming the row's first member. `filter` restricts the output to one
/// bucket kind.
pub fn find_patterns(
    view: &GridView,
    phases: &[Phase],
    threshold: usize,
    filter: Option<PatternKind>,
) -> Vec<Pattern> {
    let mut patterns = Vec::new();
    for phase in phases {
        let mut births = Vec::new();
        let mut updates = Vec::new();
        let mut deaths = Vec::new();
        for row in view.rows() {
            let state = cell_state(row.group().life(), phase.first_beat(), phase.last_beat());
            let cell = PatternCell::new(row.group().first_member_name(), phase.id());
            match state {
                CellState::Birth => births.push(cell),
                CellState::Active if row.has_cell(phase.id()) => updates.push(cell),
                CellState::Death => deaths.push(cell),
                _ => {}
            }
        }
        for (kind, cells) in [
            (PatternKind::MultipleBirths, births),
            (PatternKind::MultipleUpdates, updates),
            (PatternKind::MultipleDeaths, deaths),
        ] {
            let wanted = filter.map_or(true, |requested| requested == kind);
            if wanted && cells.len() > threshold {
                patterns.push(Pattern { kind, cells });
            }
        }
    }
    patterns
}

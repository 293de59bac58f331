//! Mining entry point: birth-list capture and kind dispatch.

use std::collections::HashMap;

use lifegrid_cluster::Phase;
use lifegrid_grid::{cell_state, CellState, GridView};

use crate::model::{MiningRules, Pattern, PatternCell, PatternKind};
use crate::{bdu, ladder};

/// Mines `view` against `phases`.
///
/// With `kind == None` the result carries every bucket pattern in phase
/// order followed by the ladders. Cell order and ladder positions follow
/// the view's current row order; callers that want the ladder geometry
/// sort the view by ascending birth first.
pub fn mine(
    view: &GridView,
    phases: &[Phase],
    kind: Option<PatternKind>,
    rules: &MiningRules,
) -> Vec<Pattern> {
    match kind {
        Some(PatternKind::Ladder) => mine_ladders(view, phases, rules),
        Some(bucket) => bdu::find_patterns(view, phases, rules.threshold, Some(bucket)),
        None => {
            let mut patterns = bdu::find_patterns(view, phases, rules.threshold, None);
            patterns.extend(mine_ladders(view, phases, rules));
            patterns
        }
    }
}

fn mine_ladders(view: &GridView, phases: &[Phase], rules: &MiningRules) -> Vec<Pattern> {
    let (birth_lists, positions) = collect_births(view, phases);
    ladder::find_patterns(&birth_lists, &positions, rules.threshold, &rules.ladder)
}

/// Captures, per phase, the ordered birth cells (phases without births
/// are dropped) plus the row-position lookup used by the gap tests.
fn collect_births(
    view: &GridView,
    phases: &[Phase],
) -> (Vec<Vec<PatternCell>>, HashMap<String, i64>) {
    let mut positions = HashMap::new();
    for (index, row) in view.rows().iter().enumerate() {
        positions
            .entry(row.group().first_member_name().to_string())
            .or_insert(index as i64);
    }

    let mut birth_lists = Vec::new();
    for phase in phases {
        let mut births = Vec::new();
        for row in view.rows() {
            let state = cell_state(row.group().life(), phase.first_beat(), phase.last_beat());
            if state == CellState::Birth {
                births.push(PatternCell::new(row.group().first_member_name(), phase.id()));
            }
        }
        if !births.is_empty() {
            birth_lists.push(births);
        }
    }
    (birth_lists, positions)
}

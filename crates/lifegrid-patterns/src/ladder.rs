//! Cross-phase birth chains.

use std::collections::HashMap;

use indexmap::IndexSet;

use crate::model::{LadderRules, Pattern, PatternCell, PatternKind};

/// Chains consecutive birth lists whose phase and row-position gaps both
/// pass the rules, emitting one pattern per run of at least `threshold`
/// chained lists.
///
/// `birth_lists` holds the per-phase birth cells in phase order, empty
/// phases already dropped; `positions` maps first-member names to their
/// row position at capture time. The gap test compares the last cell of
/// one list against the first cell of the next. A chained step appends
/// both lists to the run buffer, so interior lists arrive twice; the
/// buffer is an insertion-ordered set and keeps the first occurrence.
pub(crate) fn find_patterns(
    birth_lists: &[Vec<PatternCell>],
    positions: &HashMap<String, i64>,
    threshold: usize,
    rules: &LadderRules,
) -> Vec<Pattern> {
    let lists: Vec<&Vec<PatternCell>> = birth_lists
        .iter()
        .filter(|list| !list.is_empty())
        .collect();

    let mut patterns = Vec::new();
    let mut buffer: IndexSet<PatternCell> = IndexSet::new();
    let mut run_length = 1usize;

    for window in lists.windows(2) {
        if chains(window[0], window[1], positions, rules) {
            buffer.extend(window[0].iter().cloned());
            buffer.extend(window[1].iter().cloned());
            run_length += 1;
        } else {
            flush(&mut patterns, &mut buffer, &mut run_length, threshold);
        }
    }
    flush(&mut patterns, &mut buffer, &mut run_length, threshold);
    patterns
}

fn chains(
    current: &[PatternCell],
    next: &[PatternCell],
    positions: &HashMap<String, i64>,
    rules: &LadderRules,
) -> bool {
    let (last, first) = match (current.last(), next.first()) {
        (Some(last), Some(first)) => (last, first),
        _ => return false,
    };
    let mut phase_gap = i64::from(first.phase.as_raw()) - i64::from(last.phase.as_raw());
    let mut position_gap = position(positions, &first.entity_name) - position(positions, &last.entity_name);
    if rules.absolute_gaps {
        phase_gap = phase_gap.abs();
        position_gap = position_gap.abs();
    }
    phase_gap <= rules.max_phase_gap && position_gap <= rules.max_position_gap
}

// Names outside the capture read as position -1.
fn position(positions: &HashMap<String, i64>, name: &str) -> i64 {
    positions.get(name).copied().unwrap_or(-1)
}

fn flush(
    patterns: &mut Vec<Pattern>,
    buffer: &mut IndexSet<PatternCell>,
    run_length: &mut usize,
    threshold: usize,
) {
    if *run_length >= threshold {
        patterns.push(Pattern {
            kind: PatternKind::Ladder,
            cells: buffer.iter().cloned().collect(),
        });
    }
    *run_length = 1;
    buffer.clear();
}

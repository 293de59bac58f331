//! Adjacent-pair agglomerative clustering of timeline beats into phases.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use lifegrid_core::{BeatId, PhaseId, PhaseSettings};

use crate::distance;

/// A contiguous run of beats produced by phase clustering.
///
/// While the merge loop runs, `id` is the original position of the leftmost
/// absorbed singleton; termination renumbers ids 0..K-1 left to right. The
/// beat run is never empty and all final phases together partition the
/// timeline exactly once, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    id: PhaseId,
    beats: Vec<BeatId>,
}

impl Phase {
    fn singleton(index: usize) -> Self {
        Self {
            id: PhaseId::from_raw(index as u32),
            beats: vec![BeatId::from_raw(index as u32)],
        }
    }

    /// Builds a phase from an explicit id and inclusive beat range.
    ///
    /// Used when reconstructing clustering output from exported text.
    pub fn from_range(id: PhaseId, first: BeatId, last: BeatId) -> Self {
        let beats = (first.as_raw()..=last.as_raw())
            .map(BeatId::from_raw)
            .collect();
        Self { id, beats }
    }

    /// Phase identifier (final ids are the 0-based renumbering).
    pub fn id(&self) -> PhaseId {
        self.id
    }

    /// Ordered beats belonging to this phase.
    pub fn beats(&self) -> &[BeatId] {
        &self.beats
    }

    /// First beat of the run.
    pub fn first_beat(&self) -> BeatId {
        self.beats[0]
    }

    /// Last beat of the run.
    pub fn last_beat(&self) -> BeatId {
        self.beats[self.beats.len() - 1]
    }

    /// Whether the given beat falls inside this phase.
    pub fn contains_beat(&self, beat: BeatId) -> bool {
        self.first_beat() <= beat && beat <= self.last_beat()
    }
}

/// Merges a timeline into `settings.count` contiguous phases.
///
/// `beat_values` holds, per beat in timeline order, the entity→value map of
/// the selected measurement stream. The scan repeatedly blends value distance
/// (weight `changes_weight`) with the retained-id gap (weight
/// `1 − changes_weight`) over adjacent pairs and merges the strictly closest
/// pair, lowest index winning ties. Callers validate
/// `1 ≤ settings.count ≤ beat_values.len()` up front.
pub fn extract_phases(
    beat_values: &[BTreeMap<String, f64>],
    settings: &PhaseSettings,
) -> Vec<Phase> {
    let mut phases: Vec<Phase> = (0..beat_values.len()).map(Phase::singleton).collect();
    let mut values: Vec<BTreeMap<String, f64>> = beat_values.to_vec();

    while phases.len() > settings.count {
        let index = closest_adjacent_pair(&phases, &values, settings.changes_weight);
        merge_into_left(&mut phases, &mut values, index);
    }

    renumber(&mut phases);
    phases
}

fn closest_adjacent_pair(
    phases: &[Phase],
    values: &[BTreeMap<String, f64>],
    changes_weight: f64,
) -> usize {
    let mut min_index = 0usize;
    let mut min_distance = f64::MAX;
    for i in 0..phases.len() - 1 {
        let value_distance = distance::asymmetric_euclidean(&values[i], &values[i + 1]);
        let time_distance =
            f64::from(phases[i + 1].id.as_raw()) - f64::from(phases[i].id.as_raw());
        let blended = changes_weight * value_distance + (1.0 - changes_weight) * time_distance;
        if blended < min_distance {
            min_distance = blended;
            min_index = i;
        }
    }
    min_index
}

fn merge_into_left(phases: &mut Vec<Phase>, values: &mut Vec<BTreeMap<String, f64>>, index: usize) {
    let absorbed = phases.remove(index + 1);
    let absorbed_values = values.remove(index + 1);
    phases[index].beats.extend(absorbed.beats);
    let target = &mut values[index];
    for (entity, value) in absorbed_values {
        *target.entry(entity).or_insert(0.0) += value;
    }
}

fn renumber(phases: &mut [Phase]) {
    for (index, phase) in phases.iter_mut().enumerate() {
        phase.id = PhaseId::from_raw(index as u32);
    }
}

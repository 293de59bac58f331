//! Pure distance functions used by both merge loops.
//!
//! Keeping these standalone lets an incremental variant (cached pair
//! distances, a heap of candidates) replace the per-iteration rescan without
//! touching the observable merge decisions.

use std::collections::BTreeMap;

use lifegrid_core::BeatId;

/// Euclidean distance between two keyed value maps, iterating only the
/// smaller map's keys.
///
/// Keys present only in the larger map contribute nothing; a key missing
/// from the larger map counts as a (value, 0) pair. When both maps have the
/// same size the first map's keys drive the scan. This asymmetry is part of
/// the merge contract; the clusterings it produced are the reference
/// outputs, so it stays.
pub fn asymmetric_euclidean<K: Ord>(a: &BTreeMap<K, f64>, b: &BTreeMap<K, f64>) -> f64 {
    let (small, big) = if a.len() > b.len() { (b, a) } else { (a, b) };
    let mut sum = 0.0;
    for (key, value) in small {
        let other = big.get(key).copied().unwrap_or(0.0);
        sum += (value - other).powi(2);
    }
    sum.sqrt()
}

/// Birth component of the group distance: |birthA − birthB| / timeline.
pub fn birth_distance(a: BeatId, b: BeatId, timeline_len: usize) -> f64 {
    let gap = (f64::from(a.as_raw()) - f64::from(b.as_raw())).abs();
    gap / timeline_len as f64
}

/// Death component of the group distance.
///
/// A group with no recorded death is treated as dying at the end of the
/// timeline for this metric only.
pub fn death_distance(a: Option<BeatId>, b: Option<BeatId>, timeline_len: usize) -> f64 {
    let first = substitute_death(a, timeline_len);
    let second = substitute_death(b, timeline_len);
    (first - second).abs() / timeline_len as f64
}

fn substitute_death(death: Option<BeatId>, timeline_len: usize) -> f64 {
    match death {
        Some(beat) => f64::from(beat.as_raw()),
        None => timeline_len as f64,
    }
}

//! Three-bucket color scale for cell values.

use lifegrid_core::{BeatId, LifeSpan};

/// Color used for cells whose aggregated value is exactly zero.
pub const ZERO_VALUE_COLOR: &str = "#9fffe0";

/// Bucket colors from the low third of the value range to the high third.
pub const BUCKET_COLORS: [&str; 3] = ["#69f0ae", "#2bbd7e", "#009933"];

/// Picks the color for `value` within the observed `[min, max]` range of
/// its measurement kind.
///
/// A range wider than one unit is padded by one before bucketing, which
/// keeps the top bucket reachable only by values near the maximum. The
/// bucket index is clamped to the scale, so `value == max` always maps
/// to the darkest color instead of falling off the end.
pub fn value_color(value: f64, min: f64, max: f64) -> &'static str {
    if value == 0.0 {
        return ZERO_VALUE_COLOR;
    }
    let mut range = max - min;
    if range > 1.0 {
        range += 1.0;
    }
    let width = range / BUCKET_COLORS.len() as f64;
    if !width.is_finite() || width <= 0.0 {
        return BUCKET_COLORS[0];
    }
    let bucket = (((value - min) / width) as usize).min(BUCKET_COLORS.len() - 1);
    BUCKET_COLORS[bucket]
}

/// Whether a cell spanning `[first, last]` sits strictly inside the
/// group's lifetime, which is the only region the scale applies to.
///
/// Birth phases and death phases stay uncolored: the phase holding the
/// birth beat fails `first > birth`, and for dead groups the phase
/// holding the death beat fails `last < death`.
pub fn lifetime_interior(life: &LifeSpan, first: BeatId, last: BeatId) -> bool {
    if first <= life.birth {
        return false;
    }
    if life.alive {
        return true;
    }
    life.death.map_or(false, |death| last < death)
}

//! Lifecycle classification of a group against one phase.

use lifegrid_core::{BeatId, LifeSpan};
use serde::{Deserialize, Serialize};

/// How a group relates to the beat range covered by one phase.
///
/// The variants are checked in a fixed order, so a phase that contains
/// both the birth and the recorded death of a group reports `Birth`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CellState {
    /// The phase contains the group's birth beat (inclusive on both ends).
    Birth,
    /// The group is dead and the phase contains its recorded death beat.
    Death,
    /// The group was already born before the phase ended and had not yet
    /// died: either it is still alive, or its death lies past the phase.
    Active,
    /// The group's lifetime does not overlap the phase.
    Inactive,
}

/// Classifies `life` against the inclusive beat range `[first, last]`.
///
/// A lifespan without a recorded death can never classify as `Death`;
/// such a group is `Active` in every phase after its birth only while
/// `alive` is set, and `Inactive` otherwise.
pub fn cell_state(life: &LifeSpan, first: BeatId, last: BeatId) -> CellState {
    if first <= life.birth && life.birth <= last {
        return CellState::Birth;
    }
    if !life.alive
        && life
            .death
            .map_or(false, |death| first <= death && death <= last)
    {
        return CellState::Death;
    }
    if life.birth < last && (life.alive || life.death.map_or(false, |death| death > last)) {
        return CellState::Active;
    }
    CellState::Inactive
}

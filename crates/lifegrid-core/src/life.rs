//! Birth and death metadata for entities and merged groups.

use serde::{Deserialize, Serialize};

use crate::BeatId;

/// Lifetime metadata attached to an entity or derived for an entity group.
///
/// `death` is `None` when no death beat was ever recorded. Loaders that know
/// the last observed beat of a still-alive entity store it as `Some(last)`
/// together with `alive == true`, so exported datasets reload losslessly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifeSpan {
    /// Beat at which the entity first appears.
    pub birth: BeatId,
    /// Last recorded beat, when one is known.
    pub death: Option<BeatId>,
    /// Whether the entity is still alive at the end of the timeline.
    pub alive: bool,
}

impl LifeSpan {
    /// Creates a lifetime record.
    pub fn new(birth: BeatId, death: Option<BeatId>, alive: bool) -> Self {
        Self {
            birth,
            death,
            alive,
        }
    }

    /// Number of beats between birth and the recorded death, inclusive.
    ///
    /// Returns `None` when no death beat is recorded.
    pub fn duration(&self) -> Option<u32> {
        self.death
            .map(|death| death.as_raw().saturating_sub(self.birth.as_raw()) + 1)
    }

    /// Widens this lifetime to also cover `other`.
    ///
    /// Birth takes the minimum, death the maximum of the recorded values,
    /// and the result is alive when either side is.
    pub fn absorb(&mut self, other: &LifeSpan) {
        if other.birth < self.birth {
            self.birth = other.birth;
        }
        self.death = match (self.death, other.death) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        };
        self.alive = self.alive || other.alive;
    }
}

#![deny(missing_docs)]

//! Core data model for the lifegrid engine: timeline beats, entities and
//! lifetimes, tagged measurements, the dataset store, configuration, and the
//! shared error type.

use serde::{Deserialize, Serialize};

pub mod config;
pub mod dataset;
pub mod errors;
pub mod life;
pub mod measurement;
pub mod time;

pub use config::{
    AnalysisConfig, GroupSettings, MeasurementSelection, PatternSettings, PhaseSettings,
};
pub use dataset::{Dataset, Entity, SourceFormat};
pub use errors::{ErrorInfo, LifegridError, Result};
pub use life::LifeSpan;
pub use measurement::{AggregationKind, KindPair, Measurement, MeasurementKind};
pub use time::{parse_beat_label, Beat, TIMESTAMP_FORMAT};

/// Identifier of a timeline beat (its 0-based sequence position).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BeatId(u32);

impl BeatId {
    /// Creates an identifier from its raw integer representation.
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw integer representation of the identifier.
    pub fn as_raw(&self) -> u32 {
        self.0
    }
}

/// Identifier of a clustered phase.
///
/// During clustering a phase keeps the id of its leftmost absorbed singleton;
/// final ids are the contiguous 0-based renumbering applied at termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PhaseId(u32);

impl PhaseId {
    /// Creates an identifier from its raw integer representation.
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw integer representation of the identifier.
    pub fn as_raw(&self) -> u32 {
        self.0
    }
}

/// Identifier of a merged entity group after renumbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupId(u32);

impl GroupId {
    /// Creates an identifier from its raw integer representation.
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw integer representation of the identifier.
    pub fn as_raw(&self) -> u32 {
        self.0
    }
}

/// Identifier of an entity (its position in load order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates an identifier from its raw integer representation.
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw integer representation of the identifier.
    pub fn as_raw(&self) -> u32 {
        self.0
    }
}

//! Measurement tagging: kinds, aggregations, and tagged values.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How a measurement value was derived from the source data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MeasurementKind {
    /// The value observed at the beat itself.
    Raw,
    /// Difference against the previous recorded value of the same entity.
    Delta,
}

impl Default for MeasurementKind {
    fn default() -> Self {
        MeasurementKind::Raw
    }
}

/// Which transaction classes a summed measurement covers.
///
/// Delimited matrix inputs only carry [`AggregationKind::None`]; transition
/// logs produce all seven sum variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AggregationKind {
    /// Plain per-beat value with no transaction semantics.
    None,
    /// Insertions + deletions + updates.
    SumAll,
    /// Insertions only.
    SumInsert,
    /// Deletions only.
    SumDelete,
    /// Updates only.
    SumUpdate,
    /// Insertions + deletions.
    SumInsertDelete,
    /// Insertions + updates.
    SumInsertUpdate,
    /// Deletions + updates.
    SumDeleteUpdate,
}

impl AggregationKind {
    /// The seven transaction-sum variants, in declaration order.
    pub const TRANSACTION_SUMS: [AggregationKind; 7] = [
        AggregationKind::SumAll,
        AggregationKind::SumInsert,
        AggregationKind::SumDelete,
        AggregationKind::SumUpdate,
        AggregationKind::SumInsertDelete,
        AggregationKind::SumInsertUpdate,
        AggregationKind::SumDeleteUpdate,
    ];
}

/// A (measurement kind, aggregation kind) pair selecting one value stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct KindPair {
    /// Measurement kind component.
    pub kind: MeasurementKind,
    /// Aggregation kind component.
    pub aggregation: AggregationKind,
}

impl KindPair {
    /// Creates a kind pair.
    pub fn new(kind: MeasurementKind, aggregation: AggregationKind) -> Self {
        Self { kind, aggregation }
    }
}

impl fmt::Display for KindPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}/{:?}", self.kind, self.aggregation)
    }
}

/// One tagged numeric value attached to an (entity, beat) record.
///
/// An absent tag is not the same as a present value of zero; the store keeps
/// that distinction and grid assembly relies on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Measurement kind tag.
    pub kind: MeasurementKind,
    /// Aggregation kind tag.
    pub aggregation: AggregationKind,
    /// Numeric value for this tag.
    pub value: f64,
}

impl Measurement {
    /// Creates a tagged value.
    pub fn new(kind: MeasurementKind, aggregation: AggregationKind, value: f64) -> Self {
        Self {
            kind,
            aggregation,
            value,
        }
    }

    /// Returns the tag of this value as a [`KindPair`].
    pub fn pair(&self) -> KindPair {
        KindPair::new(self.kind, self.aggregation)
    }
}

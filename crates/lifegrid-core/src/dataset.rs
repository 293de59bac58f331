//! The in-memory measurement store consumed by clustering and grid assembly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorInfo, LifegridError, Result};
use crate::life::LifeSpan;
use crate::measurement::{AggregationKind, KindPair, Measurement, MeasurementKind};
use crate::time::Beat;
use crate::{BeatId, EntityId};

/// Input flavor a dataset was loaded from.
///
/// The flavor fixes which aggregation kinds exist for the dataset and which
/// kind pair is selected when the configuration leaves it open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceFormat {
    /// Comma separated matrix.
    Csv,
    /// Tab separated matrix.
    Tsv,
    /// Transition log folder with per-beat change records.
    TransitionLog,
    /// Re-imported project directory (dataset + grid text).
    Project,
}

impl SourceFormat {
    /// Aggregation kinds a dataset of this flavor can carry.
    pub fn available_aggregations(&self) -> Vec<AggregationKind> {
        match self {
            SourceFormat::TransitionLog => AggregationKind::TRANSACTION_SUMS.to_vec(),
            SourceFormat::Csv | SourceFormat::Tsv | SourceFormat::Project => {
                vec![AggregationKind::None]
            }
        }
    }

    /// Kind pair used when the configuration does not pick one.
    pub fn default_selection(&self) -> KindPair {
        let aggregation = match self {
            SourceFormat::TransitionLog => AggregationKind::SumAll,
            SourceFormat::Csv | SourceFormat::Tsv | SourceFormat::Project => AggregationKind::None,
        };
        KindPair::new(MeasurementKind::Raw, aggregation)
    }
}

/// One named tracked object with a lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Position of the entity in load order, 0-based.
    pub id: EntityId,
    /// Name, unique within the dataset.
    pub name: String,
    /// Birth/death metadata.
    pub life: LifeSpan,
}

/// Fully materialized measurement store: timeline, population, and tagged
/// per-(entity, beat) values.
///
/// Lookups by id or name fail loudly; a dangling reference is a dataset
/// integrity violation, never a silent zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    name: String,
    source: SourceFormat,
    timeline: Vec<Beat>,
    population: Vec<Entity>,
    records: BTreeMap<String, BTreeMap<BeatId, Vec<Measurement>>>,
}

impl Dataset {
    /// Creates an empty dataset of the given flavor.
    pub fn new(name: impl Into<String>, source: SourceFormat) -> Self {
        Self {
            name: name.into(),
            source,
            timeline: Vec::new(),
            population: Vec::new(),
            records: BTreeMap::new(),
        }
    }

    /// Dataset display name (usually derived from the input path).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Input flavor the dataset was loaded from.
    pub fn source(&self) -> SourceFormat {
        self.source
    }

    /// Ordered timeline.
    pub fn timeline(&self) -> &[Beat] {
        &self.timeline
    }

    /// Entities in load order.
    pub fn population(&self) -> &[Entity] {
        &self.population
    }

    /// Number of (entity, beat) records in the store.
    pub fn record_count(&self) -> usize {
        self.records.values().map(BTreeMap::len).sum()
    }

    /// Appends a beat, assigning the next sequence id.
    pub fn add_beat(&mut self, label: impl Into<String>) -> BeatId {
        let id = BeatId::from_raw(self.timeline.len() as u32);
        self.timeline.push(Beat::new(id, label));
        id
    }

    /// Appends an already constructed beat; its id must equal the next
    /// sequence position.
    pub fn push_beat(&mut self, beat: Beat) -> Result<()> {
        let expected = self.timeline.len() as u32;
        if beat.id.as_raw() != expected {
            return Err(LifegridError::Data(
                ErrorInfo::new("beat-out-of-sequence", "beat id breaks timeline ordering")
                    .with_context("beat", beat.id.as_raw().to_string())
                    .with_context("expected", expected.to_string()),
            ));
        }
        self.timeline.push(beat);
        Ok(())
    }

    /// Registers an entity. Names must be unique.
    pub fn add_entity(&mut self, name: impl Into<String>, life: LifeSpan) -> Result<EntityId> {
        let name = name.into();
        if self.records.contains_key(&name) || self.population.iter().any(|e| e.name == name) {
            return Err(LifegridError::Data(
                ErrorInfo::new("duplicate-entity", "entity name already registered")
                    .with_context("entity", name),
            ));
        }
        let id = EntityId::from_raw(self.population.len() as u32);
        self.population.push(Entity {
            id,
            name: name.clone(),
            life,
        });
        self.records.insert(name, BTreeMap::new());
        Ok(id)
    }

    /// Stores the tagged values observed for one (entity, beat) pair.
    ///
    /// The entity and beat must already exist and the pair must not have been
    /// recorded before.
    pub fn add_record(
        &mut self,
        entity: &str,
        beat: BeatId,
        measurements: Vec<Measurement>,
    ) -> Result<()> {
        if beat.as_raw() as usize >= self.timeline.len() {
            return Err(unknown_beat(beat, self.timeline.len()));
        }
        let slot = self.records.get_mut(entity).ok_or_else(|| {
            LifegridError::Data(
                ErrorInfo::new("unknown-entity", "record references an unregistered entity")
                    .with_context("entity", entity.to_string()),
            )
        })?;
        if slot.contains_key(&beat) {
            return Err(LifegridError::Data(
                ErrorInfo::new("duplicate-record", "measurement record already present")
                    .with_context("entity", entity.to_string())
                    .with_context("beat", beat.as_raw().to_string()),
            ));
        }
        slot.insert(beat, measurements);
        Ok(())
    }

    /// Resolves a beat id, failing loudly on a dangling reference.
    pub fn beat(&self, id: BeatId) -> Result<&Beat> {
        self.timeline
            .get(id.as_raw() as usize)
            .ok_or_else(|| unknown_beat(id, self.timeline.len()))
    }

    /// Resolves an entity by name, failing loudly when absent.
    pub fn entity(&self, name: &str) -> Result<&Entity> {
        self.population
            .iter()
            .find(|entity| entity.name == name)
            .ok_or_else(|| {
                LifegridError::Data(
                    ErrorInfo::new("unknown-entity", "entity name not present in the population")
                        .with_context("entity", name.to_string()),
                )
            })
    }

    /// All records of one entity, keyed by beat.
    pub fn records_for(&self, entity: &str) -> Option<&BTreeMap<BeatId, Vec<Measurement>>> {
        self.records.get(entity)
    }

    /// Value of the selected kind pair at one (entity, beat).
    ///
    /// `None` means no record exists there; a record that exists but lacks
    /// the pair reads as `Some(0.0)`.
    pub fn value_at(&self, entity: &str, beat: BeatId, pair: KindPair) -> Option<f64> {
        let record = self.records.get(entity)?.get(&beat)?;
        Some(pair_value(record, pair))
    }

    /// Per-beat values of one entity for the selected kind pair.
    ///
    /// Only beats with a record appear; records lacking the pair contribute
    /// an explicit 0.0 entry, which clustering distances treat as a real key.
    pub fn entity_series(&self, entity: &str, pair: KindPair) -> BTreeMap<BeatId, f64> {
        let mut series = BTreeMap::new();
        if let Some(records) = self.records.get(entity) {
            for (beat, measurements) in records {
                series.insert(*beat, pair_value(measurements, pair));
            }
        }
        series
    }

    /// Per-entity values at one beat for the selected kind pair, with the
    /// same absent-pair-reads-as-zero rule as [`Dataset::entity_series`].
    pub fn beat_slice(&self, beat: BeatId, pair: KindPair) -> BTreeMap<String, f64> {
        let mut slice = BTreeMap::new();
        for (name, records) in &self.records {
            if let Some(measurements) = records.get(&beat) {
                slice.insert(name.clone(), pair_value(measurements, pair));
            }
        }
        slice
    }
}

fn pair_value(measurements: &[Measurement], pair: KindPair) -> f64 {
    measurements
        .iter()
        .find(|m| m.pair() == pair)
        .map(|m| m.value)
        .unwrap_or(0.0)
}

fn unknown_beat(id: BeatId, timeline_len: usize) -> LifegridError {
    LifegridError::Data(
        ErrorInfo::new("unknown-beat", "beat id outside the loaded timeline")
            .with_context("beat", id.as_raw().to_string())
            .with_context("timeline", timeline_len.to_string()),
    )
}

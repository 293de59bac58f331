//! YAML configuration schema, defaults, and pre-clustering validation.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::errors::{ErrorInfo, LifegridError, Result};
use crate::measurement::{AggregationKind, KindPair, MeasurementKind};

/// YAML-configurable parameters governing one analysis run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Phase clustering parameters.
    #[serde(default)]
    pub phases: PhaseSettings,
    /// Entity grouping parameters.
    #[serde(default)]
    pub groups: GroupSettings,
    /// Which measurement stream the analysis reads.
    #[serde(default)]
    pub measurement: MeasurementSelection,
    /// Pattern mining parameters.
    #[serde(default)]
    pub patterns: PatternSettings,
}

/// Phase clustering parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseSettings {
    /// Target number of phases, 1 ≤ count ≤ timeline length.
    #[serde(default = "default_phase_count")]
    pub count: usize,
    /// Weight of the value-change distance component, in [0, 1]. The time
    /// component receives `1 - changes_weight`.
    #[serde(default = "default_phase_changes_weight")]
    pub changes_weight: f64,
}

fn default_phase_count() -> usize {
    4
}

fn default_phase_changes_weight() -> f64 {
    0.5
}

impl Default for PhaseSettings {
    fn default() -> Self {
        Self {
            count: default_phase_count(),
            changes_weight: default_phase_changes_weight(),
        }
    }
}

/// Entity grouping parameters. The three weights need not sum to 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSettings {
    /// Target number of groups, 1 ≤ count ≤ population size.
    #[serde(default = "default_group_count")]
    pub count: usize,
    /// Weight of the birth distance component.
    #[serde(default = "default_birth_weight")]
    pub birth_weight: f64,
    /// Weight of the death distance component.
    #[serde(default = "default_death_weight")]
    pub death_weight: f64,
    /// Weight of the value-change distance component.
    #[serde(default = "default_group_changes_weight")]
    pub changes_weight: f64,
}

fn default_group_count() -> usize {
    3
}

fn default_birth_weight() -> f64 {
    0.25
}

fn default_death_weight() -> f64 {
    0.25
}

fn default_group_changes_weight() -> f64 {
    0.5
}

impl Default for GroupSettings {
    fn default() -> Self {
        Self {
            count: default_group_count(),
            birth_weight: default_birth_weight(),
            death_weight: default_death_weight(),
            changes_weight: default_group_changes_weight(),
        }
    }
}

/// Measurement stream selection.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MeasurementSelection {
    /// Measurement kind, `RAW` by default.
    #[serde(default)]
    pub kind: MeasurementKind,
    /// Aggregation kind; left unset, the dataset's source format decides
    /// (`SUM_ALL` for transition logs, `NONE` for matrices and projects).
    #[serde(default)]
    pub aggregation: Option<AggregationKind>,
}

impl MeasurementSelection {
    /// Resolves the selection against a dataset's source format.
    pub fn resolve(&self, dataset: &Dataset) -> KindPair {
        match self.aggregation {
            Some(aggregation) => KindPair::new(self.kind, aggregation),
            None => {
                let mut pair = dataset.source().default_selection();
                pair.kind = self.kind;
                pair
            }
        }
    }
}

/// Pattern mining parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternSettings {
    /// Bucket/run threshold. Multi-cell buckets must strictly exceed it;
    /// ladder run lengths must reach it.
    #[serde(default = "default_pattern_threshold")]
    pub threshold: usize,
    /// Apply `abs()` to ladder gaps before the adjacency test. The legacy
    /// rule keeps gaps signed, which admits backward jumps.
    #[serde(default)]
    pub absolute_gaps: bool,
    /// Largest phase gap two birth lists may span and still chain.
    #[serde(default = "default_max_gap")]
    pub max_phase_gap: i64,
    /// Largest entity-position gap two birth lists may span and still chain.
    #[serde(default = "default_max_gap")]
    pub max_position_gap: i64,
}

fn default_pattern_threshold() -> usize {
    3
}

fn default_max_gap() -> i64 {
    3
}

impl Default for PatternSettings {
    fn default() -> Self {
        Self {
            threshold: default_pattern_threshold(),
            absolute_gaps: false,
            max_phase_gap: default_max_gap(),
            max_position_gap: default_max_gap(),
        }
    }
}

impl AnalysisConfig {
    /// Parses a configuration from YAML text.
    pub fn from_yaml(contents: &str) -> Result<Self> {
        serde_yaml::from_str(contents).map_err(|err| {
            LifegridError::Parse(ErrorInfo::new("config-parse", err.to_string()))
        })
    }

    /// Loads a configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|err| {
            LifegridError::Io(
                ErrorInfo::new("config-read", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        Self::from_yaml(&contents).map_err(|err| match err {
            LifegridError::Parse(info) => {
                LifegridError::Parse(info.with_context("path", path.display().to_string()))
            }
            other => other,
        })
    }

    /// Validates the configuration against a dataset before any clustering
    /// work begins, returning the resolved kind pair on success.
    ///
    /// Violations name the offending field in the error context.
    pub fn validate_for(&self, dataset: &Dataset) -> Result<KindPair> {
        let timeline = dataset.timeline().len();
        let population = dataset.population().len();
        if self.phases.count < 1 || self.phases.count > timeline {
            return Err(range_error(
                "phases.count",
                self.phases.count.to_string(),
                format!("expected 1..={timeline}"),
            ));
        }
        if !(0.0..=1.0).contains(&self.phases.changes_weight) {
            return Err(range_error(
                "phases.changes_weight",
                self.phases.changes_weight.to_string(),
                "expected a value in [0, 1]".to_string(),
            ));
        }
        if self.groups.count < 1 || self.groups.count > population {
            return Err(range_error(
                "groups.count",
                self.groups.count.to_string(),
                format!("expected 1..={population}"),
            ));
        }
        let pair = self.measurement.resolve(dataset);
        let available = dataset.source().available_aggregations();
        if !available.contains(&pair.aggregation) {
            return Err(LifegridError::Config(
                ErrorInfo::new(
                    "aggregation-unavailable",
                    "aggregation kind not provided by this dataset flavor",
                )
                .with_context("field", "measurement.aggregation")
                .with_context("value", format!("{:?}", pair.aggregation))
                .with_context("format", format!("{:?}", dataset.source()))
                .with_hint("matrix datasets only carry NONE; transition logs carry the sums"),
            ));
        }
        Ok(pair)
    }
}

fn range_error(field: &str, value: String, expected: String) -> LifegridError {
    LifegridError::Config(
        ErrorInfo::new("parameter-range", "configuration value out of range")
            .with_context("field", field.to_string())
            .with_context("value", value)
            .with_context("expected", expected),
    )
}

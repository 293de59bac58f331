//! Assembly of the group-by-phase measurement grid.

use std::collections::BTreeMap;

use lifegrid_cluster::{EntityGroup, Phase};
use lifegrid_core::{Dataset, ErrorInfo, GroupId, KindPair, LifegridError, PhaseId, Result};
use serde::{Deserialize, Serialize};

use crate::color::{lifetime_interior, value_color};

/// One aggregated value inside a cell, tagged with its kind pair.
///
/// Colors are assigned after assembly and only to cells that fall
/// strictly inside the owning group's lifetime; everything else keeps
/// `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellMeasurement {
    /// Tag identifying the value stream this total belongs to.
    pub pair: KindPair,
    /// Sum over every member record at every beat of the phase.
    pub value: f64,
    /// Bucket color, when the cell is colorable for this pair.
    pub color: Option<String>,
}

/// A non-empty cell: every tagged total one group accumulated over one
/// phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    phase: PhaseId,
    measurements: Vec<CellMeasurement>,
}

impl GridCell {
    /// Phase this cell belongs to.
    pub fn phase(&self) -> PhaseId {
        self.phase
    }

    /// Tagged totals in first-encountered tag order.
    pub fn measurements(&self) -> &[CellMeasurement] {
        &self.measurements
    }

    /// Looks up the total for one kind pair.
    pub fn measurement(&self, pair: KindPair) -> Option<&CellMeasurement> {
        self.measurements.iter().find(|m| m.pair == pair)
    }

    fn fold(&mut self, pair: KindPair, value: f64) {
        match self.measurements.iter_mut().find(|m| m.pair == pair) {
            Some(existing) => existing.value += value,
            None => self.measurements.push(CellMeasurement {
                pair,
                value,
                color: None,
            }),
        }
    }
}

/// One grid row: a group, its non-empty cells in phase order, and how
/// many phases it was active in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridRow {
    group: EntityGroup,
    activity: usize,
    cells: Vec<GridCell>,
}

impl GridRow {
    /// The group this row describes.
    pub fn group(&self) -> &EntityGroup {
        &self.group
    }

    /// Number of phases in which any member produced any record.
    pub fn activity(&self) -> usize {
        self.activity
    }

    /// Non-empty cells in ascending phase order.
    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    /// Returns the cell for `phase`, or `None` when no member had a
    /// record in it.
    pub fn cell(&self, phase: PhaseId) -> Option<&GridCell> {
        self.cells.iter().find(|cell| cell.phase == phase)
    }
}

/// Observed value bounds for one kind pair across the whole grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    /// Smallest cell total seen for the pair.
    pub min: f64,
    /// Largest cell total seen for the pair.
    pub max: f64,
}

impl ValueRange {
    fn seed(value: f64) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    fn widen(&mut self, value: f64) {
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }
}

/// The assembled grid: one row per group, cells summed per phase, and
/// per-pair value ranges gathered while summing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasurementGrid {
    rows: Vec<GridRow>,
    ranges: BTreeMap<KindPair, ValueRange>,
}

impl MeasurementGrid {
    /// Cross-joins `groups` with `phases` over the records in `dataset`.
    ///
    /// Each cell sums, tag by tag, the records of every member at every
    /// beat of the phase. Phases in which a group produced nothing yield
    /// no cell at all, which keeps "no activity" distinct from an
    /// activity total of zero. Coloring runs once assembly finishes, so
    /// the buckets always reflect the final per-pair ranges.
    ///
    /// Fails loudly when a group member has no slot in the dataset or a
    /// cell references a phase id outside `phases`; both mean the inputs
    /// came from different analyses.
    pub fn build(dataset: &Dataset, phases: &[Phase], groups: &[EntityGroup]) -> Result<Self> {
        let mut rows = Vec::with_capacity(groups.len());
        let mut ranges: BTreeMap<KindPair, ValueRange> = BTreeMap::new();

        for group in groups {
            let mut row = GridRow {
                group: group.clone(),
                activity: 0,
                cells: Vec::new(),
            };
            for phase in phases {
                let mut cell = GridCell {
                    phase: phase.id(),
                    measurements: Vec::new(),
                };
                for beat in phase.beats() {
                    for member in group.members() {
                        let series = dataset
                            .records_for(&member.name)
                            .ok_or_else(|| foreign_member(&member.name, group.id()))?;
                        let record = match series.get(beat) {
                            Some(record) => record,
                            None => continue,
                        };
                        for measurement in record {
                            cell.fold(measurement.pair(), measurement.value);
                        }
                    }
                }
                if cell.measurements.is_empty() {
                    continue;
                }
                for tagged in &cell.measurements {
                    ranges
                        .entry(tagged.pair)
                        .and_modify(|range| range.widen(tagged.value))
                        .or_insert_with(|| ValueRange::seed(tagged.value));
                }
                row.activity += 1;
                row.cells.push(cell);
            }
            rows.push(row);
        }

        let mut grid = Self { rows, ranges };
        grid.colorize(phases)?;
        Ok(grid)
    }

    /// Rows in group order, one per input group.
    pub fn rows(&self) -> &[GridRow] {
        &self.rows
    }

    /// Returns the row for `group`, if the grid was built over it.
    pub fn row(&self, group: GroupId) -> Option<&GridRow> {
        self.rows.iter().find(|row| row.group.id() == group)
    }

    /// Value ranges per kind pair, covering every non-empty cell.
    pub fn ranges(&self) -> &BTreeMap<KindPair, ValueRange> {
        &self.ranges
    }

    /// Returns the observed range for one kind pair.
    pub fn range(&self, pair: KindPair) -> Option<ValueRange> {
        self.ranges.get(&pair).copied()
    }

    fn colorize(&mut self, phases: &[Phase]) -> Result<()> {
        let ranges = self.ranges.clone();
        for row in &mut self.rows {
            let life = *row.group.life();
            for cell in &mut row.cells {
                let phase = phases
                    .get(cell.phase.as_raw() as usize)
                    .ok_or_else(|| foreign_phase(cell.phase))?;
                if !lifetime_interior(&life, phase.first_beat(), phase.last_beat()) {
                    continue;
                }
                for tagged in &mut cell.measurements {
                    if let Some(range) = ranges.get(&tagged.pair) {
                        tagged.color =
                            Some(value_color(tagged.value, range.min, range.max).to_string());
                    }
                }
            }
        }
        Ok(())
    }
}

fn foreign_member(name: &str, group: GroupId) -> LifegridError {
    LifegridError::Data(
        ErrorInfo::new(
            "unknown-entity",
            format!("group member {name:?} has no record slot in the dataset"),
        )
        .with_context("entity", name)
        .with_context("group", group.as_raw().to_string()),
    )
}

fn foreign_phase(phase: PhaseId) -> LifegridError {
    LifegridError::Data(ErrorInfo::new(
        "unknown-phase",
        format!("cell references phase {} outside the clustering", phase.as_raw()),
    ))
}

//! Single-pair projections of the assembled grid.

use std::collections::BTreeMap;

use lifegrid_cluster::EntityGroup;
use lifegrid_core::{KindPair, PhaseId};
use serde::{Deserialize, Serialize};

use crate::build::MeasurementGrid;
use crate::sort::{self, RowOrder};

/// One cell of a projection: the total and the color it was assigned
/// during assembly, when any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellValue {
    /// Aggregated value for the projected kind pair.
    pub value: f64,
    /// Bucket color carried over from the grid.
    pub color: Option<String>,
}

/// A row of a projection: the group plus its cells that carry the
/// projected pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewRow {
    group: EntityGroup,
    activity: usize,
    cells: BTreeMap<PhaseId, CellValue>,
}

impl ViewRow {
    /// The group this row describes.
    pub fn group(&self) -> &EntityGroup {
        &self.group
    }

    /// Number of phases in which this row carries the projected pair.
    pub fn activity(&self) -> usize {
        self.activity
    }

    /// Cells keyed by phase, ascending.
    pub fn cells(&self) -> &BTreeMap<PhaseId, CellValue> {
        &self.cells
    }

    /// Returns the cell at `phase`, if the pair was present there.
    pub fn cell(&self, phase: PhaseId) -> Option<&CellValue> {
        self.cells.get(&phase)
    }

    /// Whether the row carries the projected pair at `phase`.
    pub fn has_cell(&self, phase: PhaseId) -> bool {
        self.cells.contains_key(&phase)
    }
}

/// The grid narrowed to one kind pair: what a chart of that pair shows.
///
/// Every group keeps its row even when the pair never appears in it;
/// such rows simply have no cells and an activity of zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridView {
    pair: KindPair,
    rows: Vec<ViewRow>,
}

impl GridView {
    /// Projects `grid` onto `pair`.
    pub fn project(grid: &MeasurementGrid, pair: KindPair) -> Self {
        let rows = grid
            .rows()
            .iter()
            .map(|row| {
                let cells: BTreeMap<PhaseId, CellValue> = row
                    .cells()
                    .iter()
                    .filter_map(|cell| {
                        cell.measurement(pair).map(|tagged| {
                            (
                                cell.phase(),
                                CellValue {
                                    value: tagged.value,
                                    color: tagged.color.clone(),
                                },
                            )
                        })
                    })
                    .collect();
                ViewRow {
                    group: row.group().clone(),
                    activity: cells.len(),
                    cells,
                }
            })
            .collect();
        Self { pair, rows }
    }

    /// The kind pair this view projects.
    pub fn pair(&self) -> KindPair {
        self.pair
    }

    /// Rows in their current order.
    pub fn rows(&self) -> &[ViewRow] {
        &self.rows
    }

    /// Reorders rows in place. The sort is stable, so rows that compare
    /// equal keep their current relative order.
    pub fn sort(&mut self, order: RowOrder) {
        self.rows
            .sort_by(|a, b| sort::compare_rows(order, a, b));
    }
}

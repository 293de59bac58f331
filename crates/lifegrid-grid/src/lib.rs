//! Group-by-phase measurement grid.
//!
//! This crate turns clustering output into the grid the rest of the
//! system works from: for every (group, phase) pair it sums the member
//! records beat by beat into tagged cell totals, tracks per-tag value
//! ranges, classifies each pair against the group lifetime, and colors
//! the cells that fall strictly inside a lifetime on a three-bucket
//! scale. Views narrow the grid to a single kind pair and support the
//! row orderings charts offer.

#![deny(missing_docs)]

mod build;
mod color;
mod sort;
mod state;
mod view;

pub use build::{CellMeasurement, GridCell, GridRow, MeasurementGrid, ValueRange};
pub use color::{lifetime_interior, value_color, BUCKET_COLORS, ZERO_VALUE_COLOR};
pub use sort::RowOrder;
pub use state::{cell_state, CellState};
pub use view::{CellValue, GridView, ViewRow};

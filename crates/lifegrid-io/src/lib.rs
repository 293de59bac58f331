#![deny(missing_docs)]

//! File formats of the lifegrid engine: delimited matrix and transition log
//! loaders, dataset and grid text serialization, and project directories
//! that round-trip a clustered analysis.

use std::path::Path;

use lifegrid_core::{Dataset, Result, SourceFormat};

mod dataset_text;
mod grid_text;
mod matrix;
mod project;
mod transitions;

pub use dataset_text::{parse_dataset, render_dataset};
pub use grid_text::{parse_grid, render_grid, StoredGrid, StoredGridRow, StoredPhase};
pub use matrix::load_matrix;
pub use project::{export_project, import_project, verify_project, ImportedProject};
pub use transitions::{load_transition_log, TransitionLog};

/// Loads a dataset from any supported source.
///
/// Matrix flavors read the file directly, transition logs scan the folder
/// (dropping the per-row diagnostics; call
/// [`load_transition_log`] to keep them), and projects reload `tem.tsv`
/// from the directory.
pub fn load_dataset(path: &Path, format: SourceFormat) -> Result<Dataset> {
    match format {
        SourceFormat::Csv | SourceFormat::Tsv => matrix::load_matrix(path, format),
        SourceFormat::TransitionLog => {
            transitions::load_transition_log(path).map(|log| log.dataset)
        }
        SourceFormat::Project => project::import_project(path).map(|project| project.dataset),
    }
}

//! Project directory export and import.
//!
//! A project is a directory with `tem.tsv` (the dataset) and `gpm.tsv` (the
//! clustered grid). Import reloads the dataset, rebuilds phases and groups
//! from the grid header, recomputes the grid from scratch, and can check the
//! recomputed values against the stored ones bit for bit.

use std::fs;
use std::path::{Path, PathBuf};

use lifegrid_cluster::{EntityGroup, Phase};
use lifegrid_core::{Dataset, ErrorInfo, GroupId, LifegridError, PhaseId, Result};
use lifegrid_grid::{GridView, MeasurementGrid};

use crate::dataset_text;
use crate::grid_text::{self, StoredGrid};

const DATASET_FILE: &str = "tem.tsv";
const GRID_FILE: &str = "gpm.tsv";

/// A fully rebuilt project: the reloaded dataset, the clustering read back
/// from the grid header, the recomputed grid, and the stored values kept for
/// verification.
#[derive(Debug, Clone)]
pub struct ImportedProject {
    /// Dataset reloaded from `tem.tsv`.
    pub dataset: Dataset,
    /// Phases rebuilt from the grid header.
    pub phases: Vec<Phase>,
    /// Groups rebuilt from the stored member names, in file order.
    pub groups: Vec<EntityGroup>,
    /// Grid recomputed from the reloaded dataset.
    pub grid: MeasurementGrid,
    /// Values exactly as stored in `gpm.tsv`.
    pub stored: StoredGrid,
}

/// Writes `tem.tsv` and `gpm.tsv` into the given directory, creating it if
/// needed.
pub fn export_project(
    dir: &Path,
    dataset: &Dataset,
    view: &GridView,
    phases: &[Phase],
) -> Result<()> {
    fs::create_dir_all(dir).map_err(|err| write_error(dir, err))?;
    write_text(&dir.join(DATASET_FILE), &dataset_text::render_dataset(dataset))?;
    write_text(&dir.join(GRID_FILE), &grid_text::render_grid(view, phases))
}

/// Reads a project directory back into a working clustering state.
///
/// Dangling beat ids in the phase header and unknown member names in the
/// group lists fail loudly.
pub fn import_project(dir: &Path) -> Result<ImportedProject> {
    let name = dir
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("project")
        .to_string();
    let dataset_path = require_file(dir, DATASET_FILE)?;
    let grid_path = require_file(dir, GRID_FILE)?;

    let dataset = dataset_text::parse_dataset(&dataset_path, &name)?;
    let text = fs::read_to_string(&grid_path).map_err(|err| {
        LifegridError::Io(
            ErrorInfo::new("project-read", "failed to read project file")
                .with_context("path", grid_path.display().to_string())
                .with_hint(err.to_string()),
        )
    })?;
    let stored = grid_text::parse_grid(&text)?;

    let mut phases = Vec::new();
    for (id, first, last) in &stored.phases {
        dataset.beat(*first)?;
        dataset.beat(*last)?;
        if first > last {
            return Err(LifegridError::Data(
                ErrorInfo::new("invalid-phase-range", "phase ends before it starts")
                    .with_context("phase", id.as_raw().to_string())
                    .with_context("first", first.as_raw().to_string())
                    .with_context("last", last.as_raw().to_string()),
            ));
        }
        phases.push(Phase::from_range(*id, *first, *last));
    }

    let mut groups = Vec::new();
    for row in &stored.rows {
        let members = row
            .members
            .iter()
            .map(|member| dataset.entity(member).cloned())
            .collect::<Result<Vec<_>>>()?;
        groups.push(EntityGroup::from_members(row.group, members)?);
    }

    let grid = MeasurementGrid::build(&dataset, &phases, &groups)?;
    Ok(ImportedProject {
        dataset,
        phases,
        groups,
        grid,
        stored,
    })
}

/// Checks the recomputed grid against the stored values.
///
/// Every stored cell must reappear with the exact same value and no
/// recomputed row may carry cells the export did not have.
pub fn verify_project(project: &ImportedProject) -> Result<()> {
    let pair = project.dataset.source().default_selection();
    let view = GridView::project(&project.grid, pair);

    for stored_row in &project.stored.rows {
        let row = view
            .rows()
            .iter()
            .find(|row| row.group().id() == stored_row.group)
            .ok_or_else(|| mismatch(stored_row.group, None, "row missing after recompute"))?;
        for (phase, stored_value) in &stored_row.values {
            match row.cell(*phase) {
                Some(cell) if cell.value == *stored_value => {}
                Some(cell) => {
                    return Err(mismatch(
                        stored_row.group,
                        Some(*phase),
                        &format!("stored {} but recomputed {}", stored_value, cell.value),
                    ));
                }
                None => {
                    return Err(mismatch(
                        stored_row.group,
                        Some(*phase),
                        "stored cell missing after recompute",
                    ));
                }
            }
        }
        if row.cells().len() != stored_row.values.len() {
            return Err(mismatch(
                stored_row.group,
                None,
                "recompute produced cells the export did not have",
            ));
        }
    }
    Ok(())
}

fn require_file(dir: &Path, file: &str) -> Result<PathBuf> {
    let path = dir.join(file);
    if !path.is_file() {
        return Err(LifegridError::Io(
            ErrorInfo::new("missing-project-file", "project directory is incomplete")
                .with_context("path", dir.display().to_string())
                .with_context("file", file.to_string()),
        ));
    }
    Ok(path)
}

fn write_text(path: &Path, text: &str) -> Result<()> {
    fs::write(path, text).map_err(|err| write_error(path, err))
}

fn write_error(path: &Path, err: std::io::Error) -> LifegridError {
    LifegridError::Io(
        ErrorInfo::new("project-write", "failed to write project file")
            .with_context("path", path.display().to_string())
            .with_hint(err.to_string()),
    )
}

fn mismatch(group: GroupId, phase: Option<PhaseId>, detail: &str) -> LifegridError {
    let mut info = ErrorInfo::new("grid-mismatch", "stored grid disagrees with recomputed grid")
        .with_context("group", group.as_raw().to_string())
        .with_hint(detail);
    if let Some(phase) = phase {
        info = info.with_context("phase", phase.as_raw().to_string());
    }
    LifegridError::Data(info)
}

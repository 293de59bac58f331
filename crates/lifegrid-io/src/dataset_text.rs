//! Dataset text serialization (`tem.tsv`).
//!
//! The header names the info cell layout and lists the beat labels; every
//! other line is one entity, its lifetime packed into a
//! `{name,birth,death,status}` info cell followed by one value column per
//! beat. Beats without a record stay blank, which is how the distinction
//! between "no record" and a zero value survives a round trip.

use std::path::Path;

use lifegrid_core::{Dataset, Result, SourceFormat};

use crate::matrix;

/// Renders a dataset as tab separated text.
///
/// Values are the raw stream of the dataset's default kind pair; a recorded
/// death beat is written as is, a missing one as `-1`.
pub fn render_dataset(dataset: &Dataset) -> String {
    let pair = dataset.source().default_selection();
    let mut out = String::from("{name, birthId, deathId, status}\t");
    let labels: Vec<String> = dataset
        .timeline()
        .iter()
        .map(|beat| beat.timestamp_text())
        .collect();
    out.push_str(&labels.join("\t"));
    out.push('\n');

    for entity in dataset.population() {
        let death = match entity.life.death {
            Some(death) => death.as_raw() as i64,
            None => -1,
        };
        let status = if entity.life.alive { 1 } else { 0 };
        out.push_str(&format!(
            "{{{},{},{},{}}}\t",
            entity.name,
            entity.life.birth.as_raw(),
            death,
            status
        ));
        for beat in dataset.timeline() {
            if let Some(value) = dataset.value_at(&entity.name, beat.id, pair) {
                out.push_str(&format!("{value}"));
            }
            out.push('\t');
        }
        out.push('\n');
    }
    out
}

/// Loads dataset text back into a dataset.
///
/// The file is a tab matrix with info cells, so parsing is the matrix
/// loader's job; the reload re-derives delta measurements the same way a
/// fresh matrix load would.
pub fn parse_dataset(path: &Path, name: &str) -> Result<Dataset> {
    matrix::load_matrix_named(path, SourceFormat::Project, name)
}

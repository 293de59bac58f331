//! Delimited matrix loader.
//!
//! The first row carries beat labels from the second column on. Every other
//! row is one entity: either a bare name in the first column, or a
//! `{name,birth,death,status}` info cell written by a previous export. Blank
//! data cells mean "no record at that beat".

use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use lifegrid_core::{
    AggregationKind, BeatId, Dataset, ErrorInfo, LifeSpan, LifegridError, Measurement,
    MeasurementKind, Result, SourceFormat,
};

/// Loads a delimited matrix file into a dataset.
///
/// The dataset name is taken from the file stem. `format` must be a matrix
/// flavor; transition logs go through
/// [`load_transition_log`](crate::load_transition_log).
pub fn load_matrix(path: &Path, format: SourceFormat) -> Result<Dataset> {
    let name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("dataset")
        .to_string();
    load_matrix_named(path, format, &name)
}

pub(crate) fn load_matrix_named(path: &Path, format: SourceFormat, name: &str) -> Result<Dataset> {
    let delimiter = delimiter_for(format, path)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_path(path)
        .map_err(|err| open_error(path, err))?;

    let mut dataset = Dataset::new(name, format);
    let mut rows = reader.records();

    let header = match rows.next() {
        Some(row) => row.map_err(|err| row_error(path, 1, err))?,
        None => return Err(empty_matrix(path)),
    };
    // Column 0 of the header is the corner cell, not a beat label.
    for label in header.iter().skip(1) {
        dataset.add_beat(label.trim());
    }
    if dataset.timeline().is_empty() {
        return Err(empty_matrix(path));
    }

    for (index, row) in rows.enumerate() {
        let line = index + 2;
        let row = row.map_err(|err| row_error(path, line, err))?;
        load_entity_row(&mut dataset, &row, line)?;
    }
    Ok(dataset)
}

fn load_entity_row(dataset: &mut Dataset, row: &StringRecord, line: usize) -> Result<()> {
    let first = row.get(0).unwrap_or("").trim();
    let values: Vec<&str> = row.iter().skip(1).collect();

    let (name, life) = if first.starts_with('{') && first.ends_with('}') {
        parse_info_cell(first, line)?
    } else {
        (first.to_string(), derived_life(&values, line)?)
    };
    dataset.add_entity(&name, life)?;

    let mut previous = 0.0;
    for (column, cell) in values.iter().enumerate() {
        let cell = cell.trim();
        if cell.is_empty() {
            continue;
        }
        let value = parse_value(cell, line, column)?;
        let mut measurements = vec![Measurement::new(
            MeasurementKind::Raw,
            AggregationKind::None,
            value,
        )];
        // Values in the first data column never seed the delta baseline, so
        // the first delta of a series equals its raw value.
        if column != 0 {
            measurements.push(Measurement::new(
                MeasurementKind::Delta,
                AggregationKind::None,
                value - previous,
            ));
            previous = value;
        }
        dataset.add_record(&name, BeatId::from_raw(column as u32), measurements)?;
    }
    Ok(())
}

/// Lifetime of a plain-named row: birth at the first non-blank column, death
/// at the last one, and the entity counts as still alive.
fn derived_life(values: &[&str], line: usize) -> Result<LifeSpan> {
    let birth = values.iter().position(|cell| !cell.trim().is_empty());
    let death = values.iter().rposition(|cell| !cell.trim().is_empty());
    match (birth, death) {
        (Some(birth), Some(death)) => Ok(LifeSpan::new(
            BeatId::from_raw(birth as u32),
            Some(BeatId::from_raw(death as u32)),
            true,
        )),
        _ => Err(LifegridError::Parse(
            ErrorInfo::new("empty-entity-row", "entity row has no measurements at all")
                .with_context("line", line.to_string()),
        )),
    }
}

/// Parses a `{name,birth,death,status}` info cell. The name may itself
/// contain commas; the three trailing fields are split off from the right.
fn parse_info_cell(cell: &str, line: usize) -> Result<(String, LifeSpan)> {
    let inner = &cell[1..cell.len() - 1];
    let mut fields = inner.rsplitn(4, ',');
    let status = fields.next();
    let death = fields.next();
    let birth = fields.next();
    let name = fields.next();
    let (name, birth, death, status) = match (name, birth, death, status) {
        (Some(name), Some(birth), Some(death), Some(status)) => (name, birth, death, status),
        _ => return Err(bad_info_cell(cell, line, "expected four fields")),
    };

    let birth: u32 = birth
        .trim()
        .parse()
        .map_err(|_| bad_info_cell(cell, line, "birth is not a beat id"))?;
    let death: i64 = death
        .trim()
        .parse()
        .map_err(|_| bad_info_cell(cell, line, "death is not a beat id"))?;
    let death = if death < 0 {
        None
    } else {
        Some(BeatId::from_raw(death as u32))
    };
    let alive = status.trim() == "1";
    Ok((
        name.trim().to_string(),
        LifeSpan::new(BeatId::from_raw(birth), death, alive),
    ))
}

fn parse_value(cell: &str, line: usize, column: usize) -> Result<f64> {
    // Tolerate digit grouping commas left behind by spreadsheet exports.
    let normalized = cell.replace(',', "");
    normalized.parse().map_err(|_| {
        LifegridError::Parse(
            ErrorInfo::new("bad-number", "measurement cell is not numeric")
                .with_context("line", line.to_string())
                .with_context("column", (column + 2).to_string())
                .with_context("cell", cell.to_string()),
        )
    })
}

fn delimiter_for(format: SourceFormat, path: &Path) -> Result<u8> {
    match format {
        SourceFormat::Csv => Ok(b','),
        SourceFormat::Tsv | SourceFormat::Project => Ok(b'\t'),
        SourceFormat::TransitionLog => Err(LifegridError::Io(
            ErrorInfo::new("not-a-matrix", "transition logs are folders, not matrix files")
                .with_context("path", path.display().to_string())
                .with_hint("load transition logs through load_transition_log"),
        )),
    }
}

fn open_error(path: &Path, err: csv::Error) -> LifegridError {
    LifegridError::Io(
        ErrorInfo::new("matrix-open", "failed to open matrix file")
            .with_context("path", path.display().to_string())
            .with_hint(err.to_string()),
    )
}

fn row_error(path: &Path, line: usize, err: csv::Error) -> LifegridError {
    LifegridError::Parse(
        ErrorInfo::new("matrix-row", "failed to read matrix row")
            .with_context("path", path.display().to_string())
            .with_context("line", line.to_string())
            .with_hint(err.to_string()),
    )
}

fn empty_matrix(path: &Path) -> LifegridError {
    LifegridError::Parse(
        ErrorInfo::new("empty-matrix", "matrix file carries no beat columns")
            .with_context("path", path.display().to_string()),
    )
}

fn bad_info_cell(cell: &str, line: usize, reason: &str) -> LifegridError {
    LifegridError::Parse(
        ErrorInfo::new("bad-info-cell", "malformed entity info cell")
            .with_context("line", line.to_string())
            .with_context("cell", cell.to_string())
            .with_hint(reason),
    )
}

//! Transition log loader.
//!
//! A transition log is a project folder whose `results/` directory holds
//! three exports of a schema history: a heartbeat file naming the beats, a
//! per-table stats file naming the entities, and a `;`-separated transition
//! file with one atomic change per row. Changes are tallied per (table, beat)
//! and fanned out into the seven transaction sums.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use csv::{ReaderBuilder, StringRecord};
use globset::{Glob, GlobSet, GlobSetBuilder};
use lifegrid_core::{
    AggregationKind, Beat, BeatId, Dataset, ErrorInfo, LifeSpan, LifegridError, Measurement,
    MeasurementKind, Result, SourceFormat, TIMESTAMP_FORMAT,
};
use walkdir::WalkDir;

/// File name suffixes of the three inputs, in [`LogFiles`] slot order.
const INPUT_PATTERNS: [&str; 3] = [
    "*SchemaHeartbeat.tsv",
    "*tables_DetailedStats.tsv",
    "*transitions.csv",
];

/// Outcome of loading a transition log folder.
#[derive(Debug, Clone)]
pub struct TransitionLog {
    /// The assembled dataset.
    pub dataset: Dataset,
    /// 1-based line numbers of transition rows too short to parse, skipped.
    pub corrupt_rows: Vec<usize>,
}

/// One atomic change class the loader tallies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Change {
    Insertion,
    Deletion,
    Update,
}

/// Per (table, beat) change counts.
#[derive(Debug, Clone, Copy, Default)]
struct ChangeTally {
    insertions: u32,
    deletions: u32,
    updates: u32,
}

impl ChangeTally {
    fn record(&mut self, change: Change) {
        match change {
            Change::Insertion => self.insertions += 1,
            Change::Deletion => self.deletions += 1,
            Change::Update => self.updates += 1,
        }
    }

    fn value_for(&self, aggregation: AggregationKind) -> f64 {
        let insertions = f64::from(self.insertions);
        let deletions = f64::from(self.deletions);
        let updates = f64::from(self.updates);
        match aggregation {
            AggregationKind::None | AggregationKind::SumAll => insertions + deletions + updates,
            AggregationKind::SumInsert => insertions,
            AggregationKind::SumDelete => deletions,
            AggregationKind::SumUpdate => updates,
            AggregationKind::SumInsertDelete => insertions + deletions,
            AggregationKind::SumInsertUpdate => insertions + updates,
            AggregationKind::SumDeleteUpdate => deletions + updates,
        }
    }
}

struct LogFiles {
    timeline: PathBuf,
    tables: PathBuf,
    transitions: PathBuf,
}

/// Loads a transition log project folder into a dataset.
///
/// The dataset name is the folder name; the three inputs are discovered by
/// suffix anywhere under `results/`.
pub fn load_transition_log(project_dir: &Path) -> Result<TransitionLog> {
    let name = project_dir
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("transition-log")
        .to_string();
    let files = discover_inputs(project_dir)?;

    let mut dataset = Dataset::new(name, SourceFormat::TransitionLog);
    load_timeline(&mut dataset, &files.timeline)?;
    load_tables(&mut dataset, &files.tables)?;
    let (tallies, corrupt_rows) = load_changes(&dataset, &files.transitions)?;
    attach_measurements(&mut dataset, tallies)?;

    Ok(TransitionLog {
        dataset,
        corrupt_rows,
    })
}

fn build_globset() -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in INPUT_PATTERNS {
        builder.add(Glob::new(pattern).map_err(|err| glob_error(err.to_string()))?);
    }
    builder.build().map_err(|err| glob_error(err.to_string()))
}

fn discover_inputs(project_dir: &Path) -> Result<LogFiles> {
    let results_dir = project_dir.join("results");
    if !results_dir.is_dir() {
        return Err(LifegridError::Io(
            ErrorInfo::new("missing-results", "transition log has no results directory")
                .with_context("path", project_dir.display().to_string()),
        ));
    }

    let globset = build_globset()?;
    let mut slots: [Option<PathBuf>; 3] = [None, None, None];
    for entry in WalkDir::new(&results_dir).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let file_name = entry.file_name();
        for slot in globset.matches(file_name) {
            if slots[slot].is_none() {
                slots[slot] = Some(entry.path().to_path_buf());
            }
        }
    }

    match slots {
        [Some(timeline), Some(tables), Some(transitions)] => Ok(LogFiles {
            timeline,
            tables,
            transitions,
        }),
        _ => {
            let missing: Vec<&str> = INPUT_PATTERNS
                .iter()
                .zip(&slots)
                .filter(|(_, slot)| slot.is_none())
                .map(|(pattern, _)| *pattern)
                .collect();
            Err(LifegridError::Io(
                ErrorInfo::new("missing-log-file", "results directory lacks required inputs")
                    .with_context("path", results_dir.display().to_string())
                    .with_context("missing", missing.join(", ")),
            ))
        }
    }
}

/// Heartbeat rows: column 0 is the beat id, column 3 the version label,
/// column 4 a full timestamp.
fn load_timeline(dataset: &mut Dataset, path: &Path) -> Result<()> {
    for (line, row) in read_rows(path, b'\t')? {
        let id = BeatId::from_raw(field_u32(&row, 0, path, line)?);
        let label = field(&row, 3, path, line)?;
        let beat = match NaiveDateTime::parse_from_str(
            field(&row, 4, path, line)?,
            TIMESTAMP_FORMAT,
        ) {
            Ok(timestamp) => Beat::with_timestamp(id, label, timestamp),
            Err(_) => Beat::new(id, label),
        };
        dataset.push_beat(beat)?;
    }
    Ok(())
}

/// Table stats rows: name, duration, birth, then either the death beat or a
/// `-` marking a table still alive at its last recorded version.
fn load_tables(dataset: &mut Dataset, path: &Path) -> Result<()> {
    for (line, row) in read_rows(path, b'\t')? {
        let name = field(&row, 0, path, line)?.to_string();
        let birth = BeatId::from_raw(field_u32(&row, 2, path, line)?);
        let (death, alive) = if field(&row, 3, path, line)? == "-" {
            (BeatId::from_raw(field_u32(&row, 4, path, line)?), true)
        } else {
            (BeatId::from_raw(field_u32(&row, 3, path, line)?), false)
        };
        dataset.add_entity(name, LifeSpan::new(birth, Some(death), alive))?;
    }
    Ok(())
}

type TallyMap = BTreeMap<String, BTreeMap<BeatId, ChangeTally>>;

/// Tallies the transition rows per (table, beat).
///
/// Rows shorter than five columns are skipped and reported through the
/// returned line list; table creations and drops do not count as changes.
fn load_changes(dataset: &Dataset, path: &Path) -> Result<(TallyMap, Vec<usize>)> {
    let mut tallies = TallyMap::new();
    let mut corrupt_rows = Vec::new();

    for (line, row) in read_rows(path, b';')? {
        if row.len() < 5 {
            corrupt_rows.push(line);
            continue;
        }
        let change = match change_kind(field(&row, 4, path, line)?) {
            Some(change) => change,
            None => continue,
        };
        let beat = BeatId::from_raw(field_u32(&row, 0, path, line)?);
        dataset.beat(beat)?;
        let table = field(&row, 3, path, line)?;
        dataset.entity(table)?;
        tallies
            .entry(table.to_string())
            .or_default()
            .entry(beat)
            .or_default()
            .record(change);
    }
    Ok((tallies, corrupt_rows))
}

fn change_kind(text: &str) -> Option<Change> {
    if text.contains("NewTable") || text.contains("DeleteTable") {
        return None;
    }
    match text {
        "Insertion:UpdateTable" => Some(Change::Insertion),
        "Deletion:UpdateTable" => Some(Change::Deletion),
        "Update:KeyChange" | "Update:TypeChange" => Some(Change::Update),
        _ => None,
    }
}

/// Fans each tally out into raw values for all seven transaction sums, plus
/// deltas against the previous recorded beat of the same table. The first
/// recorded beat of a table carries no deltas.
fn attach_measurements(dataset: &mut Dataset, tallies: TallyMap) -> Result<()> {
    for (table, beats) in tallies {
        let mut previous: Option<ChangeTally> = None;
        for (beat, tally) in beats {
            let mut measurements = Vec::new();
            for aggregation in AggregationKind::TRANSACTION_SUMS {
                measurements.push(Measurement::new(
                    MeasurementKind::Raw,
                    aggregation,
                    tally.value_for(aggregation),
                ));
                if let Some(previous) = previous {
                    measurements.push(Measurement::new(
                        MeasurementKind::Delta,
                        aggregation,
                        tally.value_for(aggregation) - previous.value_for(aggregation),
                    ));
                }
            }
            dataset.add_record(&table, beat, measurements)?;
            previous = Some(tally);
        }
    }
    Ok(())
}

fn read_rows(path: &Path, delimiter: u8) -> Result<Vec<(usize, StringRecord)>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter)
        .from_path(path)
        .map_err(|err| {
            LifegridError::Io(
                ErrorInfo::new("log-open", "failed to open transition log input")
                    .with_context("path", path.display().to_string())
                    .with_hint(err.to_string()),
            )
        })?;
    let mut rows = Vec::new();
    for (index, row) in reader.records().enumerate() {
        // Line 1 is the header the reader swallows.
        let line = index + 2;
        let row = row.map_err(|err| {
            LifegridError::Parse(
                ErrorInfo::new("log-row", "failed to read transition log row")
                    .with_context("path", path.display().to_string())
                    .with_context("line", line.to_string())
                    .with_hint(err.to_string()),
            )
        })?;
        rows.push((line, row));
    }
    Ok(rows)
}

fn field<'r>(row: &'r StringRecord, index: usize, path: &Path, line: usize) -> Result<&'r str> {
    row.get(index).map(str::trim).ok_or_else(|| {
        LifegridError::Parse(
            ErrorInfo::new("log-short-row", "transition log row lacks a required column")
                .with_context("path", path.display().to_string())
                .with_context("line", line.to_string())
                .with_context("column", index.to_string()),
        )
    })
}

fn field_u32(row: &StringRecord, index: usize, path: &Path, line: usize) -> Result<u32> {
    let text = field(row, index, path, line)?;
    text.parse().map_err(|_| {
        LifegridError::Parse(
            ErrorInfo::new("log-bad-id", "transition log column is not an integer")
                .with_context("path", path.display().to_string())
                .with_context("line", line.to_string())
                .with_context("column", index.to_string())
                .with_context("value", text.to_string()),
        )
    })
}

fn glob_error(hint: String) -> LifegridError {
    LifegridError::Io(
        ErrorInfo::new("glob-build", "failed to build input file matcher").with_hint(hint),
    )
}

//! Grid text serialization (`gpm.tsv`).
//!
//! The first line describes the phases as `{id,firstBeat,lastBeat}` triples
//! joined by tabs. Every following line is one view row:
//! `groupId<TAB>{member,member,...}<TAB>{phase:value,...}`, listing only the
//! phases where the row has a cell. Values render through `{}` so re-parsing
//! reproduces the exact bits.

use std::collections::BTreeMap;

use lifegrid_cluster::Phase;
use lifegrid_core::{BeatId, ErrorInfo, GroupId, LifegridError, PhaseId, Result};
use lifegrid_grid::GridView;

/// Raw phase boundaries as stored in the header line.
pub type StoredPhase = (PhaseId, BeatId, BeatId);

/// One parsed grid row: the group, its member names, and the per-phase
/// values it carried when exported.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredGridRow {
    /// Group id the row was exported under.
    pub group: GroupId,
    /// Member entity names in merge order.
    pub members: Vec<String>,
    /// Stored cell values keyed by phase.
    pub values: BTreeMap<PhaseId, f64>,
}

/// Parsed contents of a grid text file.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredGrid {
    /// Phase boundaries from the header line.
    pub phases: Vec<StoredPhase>,
    /// Rows in file order.
    pub rows: Vec<StoredGridRow>,
}

/// Renders a view and its phases as grid text.
///
/// Rows follow the view's current sort order, so an export taken after
/// sorting replays in the same order on import.
pub fn render_grid(view: &GridView, phases: &[Phase]) -> String {
    let mut out = String::new();
    let header: Vec<String> = phases
        .iter()
        .map(|phase| {
            format!(
                "{{{},{},{}}}",
                phase.id().as_raw(),
                phase.first_beat().as_raw(),
                phase.last_beat().as_raw()
            )
        })
        .collect();
    out.push_str(&header.join("\t"));
    out.push('\n');

    for row in view.rows() {
        let members: Vec<&str> = row
            .group()
            .members()
            .iter()
            .map(|entity| entity.name.as_str())
            .collect();
        let cells: Vec<String> = phases
            .iter()
            .filter_map(|phase| {
                row.cell(phase.id())
                    .map(|cell| format!("{}:{}", phase.id().as_raw(), cell.value))
            })
            .collect();
        out.push_str(&format!(
            "{}\t{{{}}}\t{{{}}}\n",
            row.group().id().as_raw(),
            members.join(","),
            cells.join(",")
        ));
    }
    out
}

/// Parses grid text back into its stored form.
pub fn parse_grid(text: &str) -> Result<StoredGrid> {
    let mut lines = text.lines();
    let header = match lines.next() {
        Some(header) if !header.trim().is_empty() => header,
        _ => {
            return Err(grid_error(1, "grid text is missing the phase header"));
        }
    };

    let mut phases = Vec::new();
    for triple in header.split('\t') {
        let fields = brace_list(triple, 1)?;
        if fields.len() != 3 {
            return Err(grid_error(1, "phase descriptor needs id, first, and last"));
        }
        phases.push((
            PhaseId::from_raw(parse_u32(&fields[0], 1)?),
            BeatId::from_raw(parse_u32(&fields[1], 1)?),
            BeatId::from_raw(parse_u32(&fields[2], 1)?),
        ));
    }

    let mut rows = Vec::new();
    for (index, line) in lines.enumerate() {
        let number = index + 2;
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.split('\t');
        let (group, members, values) = match (fields.next(), fields.next(), fields.next()) {
            (Some(group), Some(members), Some(values)) => (group, members, values),
            _ => return Err(grid_error(number, "row needs group, members, and values")),
        };
        let group = GroupId::from_raw(parse_u32(group, number)?);
        let members = brace_list(members, number)?;
        let mut parsed = BTreeMap::new();
        for cell in brace_list(values, number)? {
            let (phase, value) = match cell.split_once(':') {
                Some(pair) => pair,
                None => return Err(grid_error(number, "cell value lacks a phase prefix")),
            };
            let phase = PhaseId::from_raw(parse_u32(phase, number)?);
            let value: f64 = value
                .parse()
                .map_err(|_| grid_error(number, "cell value is not numeric"))?;
            parsed.insert(phase, value);
        }
        rows.push(StoredGridRow {
            group,
            members,
            values: parsed,
        });
    }
    Ok(StoredGrid { phases, rows })
}

fn brace_list(text: &str, line: usize) -> Result<Vec<String>> {
    let inner = text
        .trim()
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
        .ok_or_else(|| grid_error(line, "expected a brace delimited list"))?;
    if inner.is_empty() {
        return Ok(Vec::new());
    }
    Ok(inner.split(',').map(|item| item.trim().to_string()).collect())
}

fn parse_u32(text: &str, line: usize) -> Result<u32> {
    text.trim()
        .parse()
        .map_err(|_| grid_error(line, "expected an unsigned integer"))
}

fn grid_error(line: usize, message: &str) -> LifegridError {
    LifegridError::Parse(
        ErrorInfo::new("bad-grid-text", message).with_context("line", line.to_string()),
    )
}

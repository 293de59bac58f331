pub mod cluster;
pub mod inspect;
pub mod patterns;
pub mod verify;

use std::error::Error;
use std::fs;
use std::path::Path;

use lifegrid_core::{AnalysisConfig, SourceFormat};
use lifegrid_io::load_transition_log;
use lifegrid_session::AnalysisSession;

/// Resolves the source format from an explicit flag or the input shape.
///
/// Directories holding a `tem.tsv` are projects, directories holding a
/// `results/` folder are transition logs, and files go by extension.
pub(crate) fn resolve_format(
    input: &Path,
    explicit: Option<&str>,
) -> Result<SourceFormat, Box<dyn Error>> {
    if let Some(name) = explicit {
        return parse_format(name);
    }
    if input.is_dir() {
        if input.join("tem.tsv").is_file() {
            return Ok(SourceFormat::Project);
        }
        if input.join("results").is_dir() {
            return Ok(SourceFormat::TransitionLog);
        }
        return Err(format!(
            "cannot infer a format for directory {}: expected tem.tsv (project) or results/ (transition log); pass --format",
            input.display()
        )
        .into());
    }
    match input.extension().and_then(|ext| ext.to_str()) {
        Some("csv") => Ok(SourceFormat::Csv),
        Some("tsv") => Ok(SourceFormat::Tsv),
        _ => Err(format!(
            "cannot infer a format for {}; pass --format",
            input.display()
        )
        .into()),
    }
}

fn parse_format(name: &str) -> Result<SourceFormat, Box<dyn Error>> {
    match name {
        "csv" => Ok(SourceFormat::Csv),
        "tsv" => Ok(SourceFormat::Tsv),
        "transition-log" => Ok(SourceFormat::TransitionLog),
        "project" => Ok(SourceFormat::Project),
        other => Err(format!(
            "unknown format {other:?}: expected csv, tsv, transition-log, or project"
        )
        .into()),
    }
}

pub(crate) fn format_name(format: SourceFormat) -> &'static str {
    match format {
        SourceFormat::Csv => "csv",
        SourceFormat::Tsv => "tsv",
        SourceFormat::TransitionLog => "transition-log",
        SourceFormat::Project => "project",
    }
}

/// Loads the configuration file, or the defaults when none was given.
pub(crate) fn load_config(path: Option<&Path>) -> Result<AnalysisConfig, Box<dyn Error>> {
    match path {
        Some(path) => Ok(AnalysisConfig::load(path)?),
        None => Ok(AnalysisConfig::default()),
    }
}

/// Loads `input` into the session, surfacing transition-log row
/// diagnostics on stderr instead of dropping them.
pub(crate) fn load_into_session(
    session: &mut AnalysisSession,
    input: &Path,
    format: SourceFormat,
) -> Result<(), Box<dyn Error>> {
    if format == SourceFormat::TransitionLog {
        let log = load_transition_log(input)?;
        if !log.corrupt_rows.is_empty() {
            let lines: Vec<String> = log
                .corrupt_rows
                .iter()
                .map(|line| line.to_string())
                .collect();
            eprintln!(
                "warning: skipped {} corrupt transition rows (lines {})",
                lines.len(),
                lines.join(", ")
            );
        }
        session.attach_dataset(log.dataset);
    } else {
        session.load(input, format)?;
    }
    Ok(())
}

pub(crate) fn write_json<P: AsRef<Path>, T: serde::Serialize>(
    path: P,
    value: &T,
) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.as_ref().parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

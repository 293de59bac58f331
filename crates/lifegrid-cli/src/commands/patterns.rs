use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use clap::Args;
use lifegrid_grid::RowOrder;
use lifegrid_patterns::PatternKind;
use lifegrid_session::AnalysisSession;
use serde_json::json;

#[derive(Args, Debug)]
pub struct PatternsArgs {
    /// Dataset to mine: a matrix file, a transition-log capture, or a project.
    #[arg(long)]
    pub input: PathBuf,
    /// YAML configuration file; defaults apply when omitted.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Source format when it cannot be inferred from the input.
    #[arg(long)]
    pub format: Option<String>,
    /// Mine a single kind (multiple-births, multiple-deaths,
    /// multiple-updates, ladder) instead of all four.
    #[arg(long)]
    pub kind: Option<String>,
    /// Row order used for the rows listing in patterns.json.
    #[arg(long)]
    pub sort: Option<String>,
    /// Output directory for patterns.txt and patterns.json.
    #[arg(long)]
    pub out: PathBuf,
}

pub fn run(args: &PatternsArgs) -> Result<(), Box<dyn Error>> {
    let format = super::resolve_format(&args.input, args.format.as_deref())?;
    let config = super::load_config(args.config.as_deref())?;
    let kind = match args.kind.as_deref() {
        Some(name) => Some(PatternKind::from_str(name)?),
        None => None,
    };
    let mut session = AnalysisSession::new();
    super::load_into_session(&mut session, &args.input, format)?;
    session.cluster(&config)?;
    if let Some(order) = args.sort.as_deref() {
        session.sort(RowOrder::from_str(order)?)?;
    }

    let name = session.dataset()?.name().to_string();
    let rows: Vec<String> = session
        .current_view()?
        .rows()
        .iter()
        .map(|row| row.group().first_member_name().to_string())
        .collect();

    let report = session.pattern_report(kind)?;
    fs::create_dir_all(&args.out)?;
    fs::write(args.out.join("patterns.txt"), &report)?;

    let patterns = session.patterns(kind)?;
    let dump = json!({
        "project": name,
        "kind": args.kind.as_deref().unwrap_or("all"),
        "count": patterns.len(),
        "rows": rows,
        "patterns": patterns,
    });
    super::write_json(args.out.join("patterns.json"), &dump)?;

    println!(
        "mined {} patterns; report written to {}",
        patterns.len(),
        args.out.display()
    );
    Ok(())
}

use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use lifegrid_session::AnalysisSession;
use serde_json::json;

#[derive(Args, Debug)]
pub struct ClusterArgs {
    /// Dataset to cluster: a matrix file, a transition-log capture, or a project.
    #[arg(long)]
    pub input: PathBuf,
    /// YAML configuration file; defaults apply when omitted.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Source format when it cannot be inferred from the input.
    #[arg(long)]
    pub format: Option<String>,
    /// Output directory for the project files and the JSON summary.
    #[arg(long)]
    pub out: PathBuf,
}

pub fn run(args: &ClusterArgs) -> Result<(), Box<dyn Error>> {
    let format = super::resolve_format(&args.input, args.format.as_deref())?;
    let config = super::load_config(args.config.as_deref())?;
    let mut session = AnalysisSession::new();
    super::load_into_session(&mut session, &args.input, format)?;
    session.cluster(&config)?;
    session.export_project(&args.out)?;

    let dataset = session.dataset()?;
    let view = session.current_view()?;
    let phases = session.phases()?;
    let summary = json!({
        "dataset": dataset.name(),
        "source": dataset.source(),
        "beats": session.beat_count(),
        "entities": session.entity_count(),
        "records": session.record_count(),
        "measurement": view.pair(),
        "phases": phases
            .iter()
            .map(|phase| {
                json!({
                    "id": phase.id().as_raw(),
                    "first_beat": phase.first_beat().as_raw(),
                    "last_beat": phase.last_beat().as_raw(),
                })
            })
            .collect::<Vec<_>>(),
        "groups": view
            .rows()
            .iter()
            .map(|row| {
                json!({
                    "id": row.group().id().as_raw(),
                    "first_member": row.group().first_member_name(),
                    "members": row.group().members().len(),
                    "activity": row.activity(),
                })
            })
            .collect::<Vec<_>>(),
    });
    super::write_json(args.out.join("summary.json"), &summary)?;

    println!(
        "clustered {} into {} phases and {} groups; project written to {}",
        dataset.name(),
        phases.len(),
        view.rows().len(),
        args.out.display()
    );
    Ok(())
}

use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use lifegrid_session::AnalysisSession;

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Dataset to describe: a matrix file, a transition-log capture, or a project.
    #[arg(long)]
    pub input: PathBuf,
    /// Source format when it cannot be inferred from the input.
    #[arg(long)]
    pub format: Option<String>,
}

pub fn run(args: &InspectArgs) -> Result<(), Box<dyn Error>> {
    let format = super::resolve_format(&args.input, args.format.as_deref())?;
    let mut session = AnalysisSession::new();
    super::load_into_session(&mut session, &args.input, format)?;

    let dataset = session.dataset()?;
    println!("dataset: {}", dataset.name());
    println!("source: {}", super::format_name(dataset.source()));
    let timeline = dataset.timeline();
    match (timeline.first(), timeline.last()) {
        (Some(first), Some(last)) => {
            println!("beats: {} ({} .. {})", timeline.len(), first.label, last.label)
        }
        _ => println!("beats: 0"),
    }
    println!("entities: {}", dataset.population().len());
    println!("records: {}", dataset.record_count());
    let aggregations: Vec<String> = dataset
        .source()
        .available_aggregations()
        .iter()
        .map(|aggregation| format!("{aggregation:?}"))
        .collect();
    println!("aggregations: {}", aggregations.join(", "));
    Ok(())
}

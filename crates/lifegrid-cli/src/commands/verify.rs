use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use lifegrid_cluster::{extract_groups, extract_phases};
use lifegrid_core::AnalysisConfig;
use lifegrid_io::{import_project, verify_project, ImportedProject};

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Project directory holding tem.tsv and gpm.tsv.
    #[arg(long)]
    pub project: PathBuf,
    /// Optional configuration; when given, clustering is recomputed and
    /// compared against the stored phases and groups.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn run(args: &VerifyArgs) -> Result<(), Box<dyn Error>> {
    let imported = import_project(&args.project)?;
    verify_project(&imported)?;
    println!(
        "grid verified: {} rows match the stored values",
        imported.stored.rows.len()
    );
    if let Some(path) = &args.config {
        let config = AnalysisConfig::load(path)?;
        check_config_reproduces(&imported, &config)?;
        println!("clustering verified: the configuration reproduces the stored phases and groups");
    }
    Ok(())
}

/// Reclusters the reloaded dataset under `config` and compares the outcome
/// against what the project stores.
fn check_config_reproduces(
    imported: &ImportedProject,
    config: &AnalysisConfig,
) -> Result<(), Box<dyn Error>> {
    let dataset = &imported.dataset;
    let pair = config.validate_for(dataset)?;

    let beat_values: Vec<_> = dataset
        .timeline()
        .iter()
        .map(|beat| dataset.beat_slice(beat.id, pair))
        .collect();
    let phases = extract_phases(&beat_values, &config.phases);
    if phases.len() != imported.phases.len() {
        return Err(format!(
            "configuration yields {} phases but the project stores {}",
            phases.len(),
            imported.phases.len()
        )
        .into());
    }
    for (computed, stored) in phases.iter().zip(&imported.phases) {
        if computed.first_beat() != stored.first_beat() || computed.last_beat() != stored.last_beat()
        {
            return Err(format!(
                "phase {} spans beats {}..{} but the project stores {}..{}",
                stored.id().as_raw(),
                computed.first_beat().as_raw(),
                computed.last_beat().as_raw(),
                stored.first_beat().as_raw(),
                stored.last_beat().as_raw()
            )
            .into());
        }
    }

    let series: Vec<_> = dataset
        .population()
        .iter()
        .map(|entity| dataset.entity_series(&entity.name, pair))
        .collect();
    let groups = extract_groups(
        dataset.population(),
        &series,
        dataset.timeline().len(),
        &config.groups,
    );
    if groups.len() != imported.groups.len() {
        return Err(format!(
            "configuration yields {} groups but the project stores {}",
            groups.len(),
            imported.groups.len()
        )
        .into());
    }
    for (computed, stored) in groups.iter().zip(&imported.groups) {
        let computed_members: Vec<&str> = computed
            .members()
            .iter()
            .map(|member| member.name.as_str())
            .collect();
        let stored_members: Vec<&str> = stored
            .members()
            .iter()
            .map(|member| member.name.as_str())
            .collect();
        if computed_members != stored_members {
            return Err(format!(
                "group {} members diverge: configuration yields [{}] but the project stores [{}]",
                stored.id().as_raw(),
                computed_members.join(", "),
                stored_members.join(", ")
            )
            .into());
        }
    }
    Ok(())
}

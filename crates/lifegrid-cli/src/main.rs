use std::error::Error;

use clap::{Parser, Subcommand};

use commands::{
    cluster::{self, ClusterArgs},
    inspect::{self, InspectArgs},
    patterns::{self, PatternsArgs},
    verify::{self, VerifyArgs},
};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "lifegrid", about = "Temporal lifecycle analysis over evolving populations")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Cluster a dataset and write the project files plus a JSON summary.
    Cluster(ClusterArgs),
    /// Cluster a dataset, mine its view, and write the pattern report.
    Patterns(PatternsArgs),
    /// Print dataset statistics without clustering.
    Inspect(InspectArgs),
    /// Recompute an exported project's grid and compare it to the stored one.
    Verify(VerifyArgs),
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    match cli.command {
        Command::Cluster(args) => cluster::run(&args),
        Command::Patterns(args) => patterns::run(&args),
        Command::Inspect(args) => inspect::run(&args),
        Command::Verify(args) => verify::run(&args),
    }
}

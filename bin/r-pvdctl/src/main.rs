//! ---
//! pvd_section: "05-networking-external-interfaces"
//! pvd_subsection: "binary"
//! pvd_type: "source"
//! pvd_scope: "code"
//! pvd_description: "Control CLI for engineers interacting with R-PVD."
//! pvd_version: "v0.0.0-prealpha"
//! pvd_owner: "tbd"
//! ---
use anyhow::Result;
use clap::{Parser, Subcommand};
use r_pvd_logging as logging;

mod calc;
mod norms;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "R-PVD conductor sizing and validation utility",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Run the sizing pipeline over a project's take-off tables")]
    Calc(calc::CalcArgs),
    #[command(about = "Validate a string take-off table without sizing it")]
    Dataset(calc::DatasetArgs),
    #[command(about = "Replay a what-if simulation request")]
    Simulate(calc::SimulateArgs),
    #[command(subcommand, about = "Inspect normative profiles and project overrides")]
    Norms(norms::NormsCommand),
}

fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Calc(args) => calc::run(args)?,
        Commands::Dataset(args) => calc::run_dataset(args)?,
        Commands::Simulate(args) => calc::run_simulate(args)?,
        Commands::Norms(cmd) => norms::run(cmd)?,
    }
    Ok(())
}

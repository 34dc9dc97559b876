//! ---
//! pvd_section: "05-networking-external-interfaces"
//! pvd_subsection: "binary"
//! pvd_type: "source"
//! pvd_scope: "code"
//! pvd_description: "Control CLI for engineers interacting with R-PVD."
//! pvd_version: "v0.0.0-prealpha"
//! pvd_owner: "tbd"
//! ---
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use r_pvd_calc_engine::{
    analyze_project_with_options,
    api::SimulationRequest,
    dataset::validate_string_dataset,
    io::{load_cn1_rows, load_project_spec, load_string_rows},
    simulation::Simulator,
};
use r_pvd_norms::{builtin_catalog, effective_profile, NormativeCatalog, ProjectPaths};

#[derive(Debug, Args)]
pub struct CalcArgs {
    /// Project spec file (JSON or YAML).
    #[arg(long)]
    project: PathBuf,
    /// String take-off table (CSV).
    #[arg(long)]
    strings: PathBuf,
    /// CN1 feeder table (CSV); skipped when absent.
    #[arg(long)]
    cn1: Option<PathBuf>,
    /// Normative profile to size against.
    #[arg(long, default_value = "IEC")]
    norm: String,
    /// Catalog file overriding the built-in profiles.
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// Directory holding per-project override manifests.
    #[arg(long, default_value = r_pvd_norms::DEFAULT_PROJECTS_ROOT)]
    projects_root: PathBuf,
    /// Report output directory.
    #[arg(long, default_value = "reports")]
    output: PathBuf,
}

pub fn run(args: CalcArgs) -> Result<()> {
    let catalog = resolve_catalog(args.catalog.as_deref())?;
    let project = load_project_spec(&args.project)
        .with_context(|| format!("failed to load project spec {}", args.project.display()))?;
    let string_rows = load_string_rows(&args.strings)
        .with_context(|| format!("failed to load string table {}", args.strings.display()))?;
    let cn1_rows = match &args.cn1 {
        Some(path) => load_cn1_rows(path)
            .with_context(|| format!("failed to load CN1 table {}", path.display()))?,
        None => Vec::new(),
    };

    let paths = ProjectPaths::new(&args.projects_root);
    let norm = effective_profile(&catalog, &args.norm, Some((&paths, project.name.as_str())))?;

    let summary = analyze_project_with_options(
        &project,
        &string_rows,
        &cn1_rows,
        norm,
        Some(&args.output),
    )?;

    println!(
        "{} [{}] strings {}/{} ok, cn1 {}/{} ok, compliance score {:.1}",
        summary.project,
        summary.norm_key,
        summary.strings.summary.succeeded,
        summary.strings.summary.total,
        summary.cn1.summary.succeeded,
        summary.cn1.summary.total,
        summary.validation.score,
    );
    for finding in &summary.dataset.findings {
        match finding.row {
            Some(row) => println!("  dataset {}: row {}: {}", finding.severity, row, finding.message),
            None => println!("  dataset {}: {}", finding.severity, finding.message),
        }
    }
    println!("reports written to {}", args.output.display());
    Ok(())
}

#[derive(Debug, Args)]
pub struct DatasetArgs {
    /// String take-off table (CSV).
    #[arg(long)]
    strings: PathBuf,
}

pub fn run_dataset(args: DatasetArgs) -> Result<()> {
    let rows = load_string_rows(&args.strings)
        .with_context(|| format!("failed to load string table {}", args.strings.display()))?;
    let report = validate_string_dataset(&rows);

    if report.findings.is_empty() {
        println!("{} rows, no findings", rows.len());
        return Ok(());
    }
    for finding in &report.findings {
        match finding.row {
            Some(row) => println!("{}: row {}: {}", finding.severity, row, finding.message),
            None => println!("{}: {}", finding.severity, finding.message),
        }
    }
    println!(
        "{} rows, {} errors, {} warnings",
        rows.len(),
        report.error_count(),
        report.warning_count()
    );
    Ok(())
}

#[derive(Debug, Args)]
pub struct SimulateArgs {
    /// Simulation request file (JSON or YAML): baseline run, factors,
    /// and staged edits.
    #[arg(long)]
    input: PathBuf,
}

pub fn run_simulate(args: SimulateArgs) -> Result<()> {
    let raw = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let request: SimulationRequest = if raw.trim_start().starts_with('{') {
        serde_json::from_str(&raw)?
    } else {
        serde_yaml::from_str(&raw)?
    };

    let mut simulator = Simulator::new(request.base, request.factors)?;
    for edit in &request.edits {
        simulator.set_parameter(edit.parameter, edit.value);
    }
    let outcome = simulator.recompute()?;

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

fn resolve_catalog(path: Option<&std::path::Path>) -> Result<NormativeCatalog> {
    match path {
        Some(path) => NormativeCatalog::load(path),
        None => Ok(builtin_catalog().clone()),
    }
}

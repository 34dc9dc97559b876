//! ---
//! pvd_section: "05-networking-external-interfaces"
//! pvd_subsection: "binary"
//! pvd_type: "source"
//! pvd_scope: "code"
//! pvd_description: "Control CLI for engineers interacting with R-PVD."
//! pvd_version: "v0.0.0-prealpha"
//! pvd_owner: "tbd"
//! ---
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};

use r_pvd_norms::{
    builtin_catalog, load_overrides, remove_overrides, save_overrides, NormOverrides,
    NormativeCatalog, OverrideValue, ProjectPaths,
};

#[derive(Debug, Subcommand)]
pub enum NormsCommand {
    #[command(about = "List the available normative profiles")]
    List(CatalogArgs),
    #[command(about = "Dump one profile as YAML")]
    Show {
        name: String,
        #[command(flatten)]
        catalog: CatalogArgs,
    },
    #[command(about = "Set one override parameter for a project")]
    Set {
        project: String,
        /// Dot-path of the parameter, e.g. voltage_drop.max_percentage
        path: String,
        value: String,
        #[arg(long, default_value = "IEC")]
        base_norm: String,
        #[command(flatten)]
        root: ProjectsRootArgs,
    },
    #[command(about = "Show a project's override manifest")]
    Overrides {
        project: String,
        #[command(flatten)]
        root: ProjectsRootArgs,
    },
    #[command(about = "Delete a project's overrides, restoring profile defaults")]
    Clear {
        project: String,
        #[command(flatten)]
        root: ProjectsRootArgs,
    },
}

#[derive(Debug, Args)]
pub struct CatalogArgs {
    /// Catalog file overriding the built-in profiles.
    #[arg(long)]
    catalog: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ProjectsRootArgs {
    /// Directory holding per-project override manifests.
    #[arg(long, default_value = r_pvd_norms::DEFAULT_PROJECTS_ROOT)]
    projects_root: PathBuf,
}

pub fn run(command: NormsCommand) -> Result<()> {
    match command {
        NormsCommand::List(args) => {
            let catalog = resolve_catalog(&args)?;
            for (key, profile) in &catalog.normatives {
                println!("{key}: {} ({})", profile.name, profile.country);
            }
        }
        NormsCommand::Show { name, catalog } => {
            let catalog = resolve_catalog(&catalog)?;
            let profile = catalog.get(&name)?;
            println!("{}", serde_yaml::to_string(profile)?);
        }
        NormsCommand::Set {
            project,
            path,
            value,
            base_norm,
            root,
        } => {
            let paths = ProjectPaths::new(&root.projects_root);
            let mut overrides = load_overrides(&paths, &project)?
                .map(|manifest| manifest.modified)
                .unwrap_or_else(NormOverrides::new);
            overrides.insert(path.clone(), parse_value(&value));
            let manifest_path = save_overrides(&paths, &project, &base_norm, overrides)?;
            println!("{path} saved to {}", manifest_path.display());
        }
        NormsCommand::Overrides { project, root } => {
            let paths = ProjectPaths::new(&root.projects_root);
            match load_overrides(&paths, &project)? {
                Some(manifest) => {
                    println!(
                        "{} on {} (updated {})",
                        manifest.meta.project, manifest.meta.base_norm, manifest.meta.updated_at
                    );
                    for (path, value) in &manifest.modified {
                        println!("  {path} = {value:?}");
                    }
                }
                None => return Err(anyhow!("project '{project}' has no overrides")),
            }
        }
        NormsCommand::Clear { project, root } => {
            let paths = ProjectPaths::new(&root.projects_root);
            if remove_overrides(&paths, &project)? {
                println!("overrides cleared for '{project}'");
            } else {
                println!("project '{project}' had no overrides");
            }
        }
    }
    Ok(())
}

fn resolve_catalog(args: &CatalogArgs) -> Result<NormativeCatalog> {
    match &args.catalog {
        Some(path) => NormativeCatalog::load(path),
        None => Ok(builtin_catalog().clone()),
    }
}

fn parse_value(raw: &str) -> OverrideValue {
    if let Ok(flag) = raw.parse::<bool>() {
        return OverrideValue::Flag(flag);
    }
    if let Ok(number) = raw.parse::<f64>() {
        return OverrideValue::Number(number);
    }
    OverrideValue::Text(raw.to_owned())
}

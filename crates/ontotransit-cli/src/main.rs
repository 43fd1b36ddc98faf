//! Transit ontology CLI.
//!
//! Thin boundary over the library crates: reads the table files, runs the
//! population pipeline, invokes the reasoner once, and renders the run
//! report. All domain logic lives in `ontotransit-populate` and
//! `ontotransit-reason`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use ontotransit_graph::Graph;
use ontotransit_populate::{build_report, populate, Row, RunReport, TaxonomyConfig, TransitTables};
use ontotransit_reason::ModelCheckReasoner;
use ontotransit_schema::transit_schema;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "ontotransit")]
#[command(
    author,
    version,
    about = "Transit feed tables in, classified knowledge graph out"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Populate the ontology from a directory of transit tables, classify
    /// it, and print the run report.
    Populate {
        /// Directory containing the table files (stops.json, routes.json, ...)
        data_dir: PathBuf,
        /// Taxonomy configuration JSON (defaults to the built-in GTFS vocabulary)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Reasoning deadline in seconds
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,
        /// Write the full run report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
        /// Write the resolved graph snapshot as JSON
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },

    /// Print the built-in taxonomy configuration as JSON (a starting point
    /// for `--config`).
    DefaultConfig {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

/// Table files the populate command looks for. A missing file is an empty
/// table, not an error: most feeds ship without pathways or levels.
const LEVELS_FILE: &str = "levels.json";
const STOPS_FILE: &str = "stops.json";
const ROUTES_FILE: &str = "routes.json";
const TRIPS_FILE: &str = "trips.json";
const STOP_TIMES_FILE: &str = "stop_times.json";
const TRANSFERS_FILE: &str = "transfers.json";
const PATHWAYS_FILE: &str = "pathways.json";
const FARES_FILE: &str = "fare_attributes.json";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Populate {
            data_dir,
            config,
            timeout_secs,
            report,
            snapshot,
        } => cmd_populate(
            &data_dir,
            config.as_deref(),
            Duration::from_secs(timeout_secs),
            report.as_deref(),
            snapshot.as_deref(),
        ),
        Commands::DefaultConfig { out } => cmd_default_config(out.as_deref()),
    }
}

fn cmd_populate(
    data_dir: &Path,
    config_path: Option<&Path>,
    timeout: Duration,
    report_path: Option<&Path>,
    snapshot_path: Option<&Path>,
) -> Result<()> {
    println!("{} {}", "Populating".green().bold(), data_dir.display());

    let tables = load_tables(data_dir)?;
    let config = load_config(config_path)?;
    let schema = transit_schema();
    let mut graph = Graph::new();

    let result = populate(&tables, &schema, &config, &mut graph)
        .context("population failed, discarding graph")?;

    let reasoner = ModelCheckReasoner::new();
    ontotransit_reason::invoke(&reasoner, &mut graph, &schema, &result.axioms, timeout)
        .context("reasoning failed")?;

    let run_report = build_report(&graph, &result.warnings);
    print_report(&run_report);

    if let Some(path) = report_path {
        let json = serde_json::to_string_pretty(&run_report)?;
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        eprintln!("{} {}", "wrote".green().bold(), path.display().to_string().bold());
    }
    if let Some(path) = snapshot_path {
        let json = serde_json::to_string_pretty(&graph.snapshot())?;
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        eprintln!("{} {}", "wrote".green().bold(), path.display().to_string().bold());
    }
    Ok(())
}

fn cmd_default_config(out: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(&TaxonomyConfig::default())?;
    match out {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            eprintln!("{} {}", "wrote".green().bold(), path.display().to_string().bold());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn load_tables(dir: &Path) -> Result<TransitTables> {
    Ok(TransitTables {
        levels: load_table(dir, LEVELS_FILE)?,
        stops: load_table(dir, STOPS_FILE)?,
        routes: load_table(dir, ROUTES_FILE)?,
        trips: load_table(dir, TRIPS_FILE)?,
        schedule_entries: load_table(dir, STOP_TIMES_FILE)?,
        transfers: load_table(dir, TRANSFERS_FILE)?,
        pathways: load_table(dir, PATHWAYS_FILE)?,
        fares: load_table(dir, FARES_FILE)?,
    })
}

fn load_table(dir: &Path, file: &str) -> Result<Vec<Row>> {
    let path = dir.join(file);
    if !path.exists() {
        tracing::warn!(file, "table file missing, treating as empty");
        return Ok(Vec::new());
    }
    let text =
        fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn load_config(path: Option<&Path>) -> Result<TaxonomyConfig> {
    match path {
        Some(p) => {
            let text =
                fs::read_to_string(p).with_context(|| format!("reading {}", p.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {}", p.display()))
        }
        None => Ok(TaxonomyConfig::default()),
    }
}

fn print_report(report: &RunReport) {
    println!(
        "{} {} individuals, {} edges",
        "ok".green().bold(),
        report.individuals,
        report.edges
    );
    for (kind, n) in &report.individuals_by_kind {
        println!("  {kind}: {n}");
    }
    if !report.warnings.is_empty() {
        eprintln!(
            "{} {} unclassified individuals",
            "info:".yellow().bold(),
            report.warnings.len()
        );
        for warning in &report.warnings {
            eprintln!("  {warning}");
        }
    }
    println!(
        "{} {} type assertions",
        "Inferred".green().bold(),
        report.inferred.len()
    );
    for inferred in &report.inferred {
        println!("  {} : {}", inferred.individual, inferred.class.bold());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_table_files_load_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(STOPS_FILE),
            r#"[{"stop_id": "S1", "stop_name": "Centre"}]"#,
        )
        .unwrap();

        let tables = load_tables(dir.path()).unwrap();
        assert_eq!(tables.stops.len(), 1);
        assert!(tables.pathways.is_empty());
        assert!(tables.levels.is_empty());
    }

    #[test]
    fn test_malformed_table_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(ROUTES_FILE), "not json").unwrap();

        let err = load_tables(dir.path()).unwrap_err();
        assert!(err.to_string().contains(ROUTES_FILE));
    }

    #[test]
    fn test_config_file_overrides_default_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taxonomy.json");
        fs::write(&path, r#"{"fast_transfer_threshold_secs": 60}"#).unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.fast_transfer_threshold_secs, 60);
        // Unlisted sections keep the built-in vocabulary.
        assert!(!config.route_classes.is_empty());
    }

    #[test]
    fn test_default_config_round_trips() {
        let json = serde_json::to_string(&TaxonomyConfig::default()).unwrap();
        let back: TaxonomyConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.fast_transfer_threshold_secs, 180);
    }
}

//! Command-line surface: argument parsing and subcommand dispatch.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use thiserror::Error;

use crate::config::{self, GeneratorConfig};
use crate::db::{self, DatabaseError};
use crate::generators::GenerationError;
use crate::pipeline::{run_pipeline, RunSummary};
use crate::report::VerificationReport;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Failed to encode JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Parser)]
#[command(
    name = "icu-synth",
    version,
    about = "Generate a synthetic ICU dataset in the OMOP CDM",
    long_about = "icu-synth populates OMOP CDM clinical tables (person, visit_occurrence,\n\
        condition_occurrence, measurement, drug_exposure, procedure_occurrence)\n\
        with synthetic ICU stays, resolving clinical terms against the concept table.\n\n\
        EXAMPLES:\n\
        \n  icu-synth init                         Create schema and demo vocabulary\n\
        \n  icu-synth generate --patients 500      Generate 500 ICU patients\n\
        \n  icu-synth report --json                Print the verification report as JSON"
)]
pub struct Cli {
    /// SQLite database holding the vocabulary and clinical tables
    #[arg(short, long, global = true, env = "ICU_SYNTH_DATABASE")]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn database_path(&self) -> PathBuf {
        self.database
            .clone()
            .unwrap_or_else(config::default_database_path)
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Populate the clinical tables with synthetic ICU data
    Generate(GenerateArgs),

    /// Create the schema and install the built-in demo vocabulary
    Init(InitArgs),

    /// Print row counts and samples for an existing database
    Report(ReportArgs),
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Number of synthetic patients
    #[arg(short = 'n', long, env = "ICU_SYNTH_PATIENTS", default_value_t = config::DEFAULT_PATIENT_COUNT)]
    pub patients: usize,

    /// Random seed; the same seed and vocabulary reproduce the same data
    #[arg(short, long, env = "ICU_SYNTH_SEED", default_value_t = config::DEFAULT_SEED)]
    pub seed: u64,

    #[arg(long, env = "ICU_SYNTH_VITALS_BATCH_SIZE", default_value_t = 10_000)]
    pub vitals_batch_size: usize,

    #[arg(long, env = "ICU_SYNTH_LABS_BATCH_SIZE", default_value_t = 5_000)]
    pub labs_batch_size: usize,

    #[arg(long, env = "ICU_SYNTH_VENTILATION_BATCH_SIZE", default_value_t = 10_000)]
    pub ventilation_batch_size: usize,

    /// Share of episodes that receive ventilator readings
    #[arg(long, env = "ICU_SYNTH_VENTILATED_FRACTION", default_value_t = 0.6)]
    pub ventilated_fraction: f64,

    /// Keep existing clinical rows and append after their ids
    #[arg(long, env = "ICU_SYNTH_APPEND")]
    pub append: bool,

    /// Install the demo vocabulary before generating
    #[arg(long)]
    pub demo_vocabulary: bool,

    /// Skip the verification report
    #[arg(long)]
    pub no_report: bool,

    /// Print the run summary and report as JSON
    #[arg(long)]
    pub json: bool,
}

impl GenerateArgs {
    pub fn config(&self) -> GeneratorConfig {
        GeneratorConfig {
            patient_count: self.patients,
            seed: self.seed,
            vitals_batch_size: self.vitals_batch_size,
            labs_batch_size: self.labs_batch_size,
            ventilation_batch_size: self.ventilation_batch_size,
            ventilated_fraction: self.ventilated_fraction,
            clear_existing: !self.append,
        }
    }
}

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Create the schema without installing the demo vocabulary
    #[arg(long)]
    pub schema_only: bool,
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(serde::Serialize)]
struct GenerateOutput<'a> {
    summary: &'a RunSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<&'a VerificationReport>,
}

/// Run the parsed command against its database.
pub fn execute(cli: &Cli) -> Result<(), CliError> {
    let path = cli.database_path();
    tracing::info!(database = %path.display(), "Opening database");
    let conn = db::open_database(&path)?;

    match &cli.command {
        Command::Init(args) => {
            if args.schema_only {
                tracing::info!("Schema ready");
            } else {
                let installed = db::install_demo_vocabulary(&conn)?;
                tracing::info!(installed, "Demo vocabulary installed");
            }
            println!("Initialized {}", path.display());
        }
        Command::Generate(args) => {
            if args.demo_vocabulary {
                db::install_demo_vocabulary(&conn)?;
            }
            let summary = run_pipeline(&conn, &args.config())?;
            let report = if args.no_report {
                None
            } else {
                Some(VerificationReport::collect(&conn)?)
            };

            if args.json {
                let output = GenerateOutput {
                    summary: &summary,
                    report: report.as_ref(),
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!(
                    "Generated {} patients ({} measurements) in {} ms, run {}",
                    summary.persons,
                    summary.measurements(),
                    summary.elapsed_ms,
                    summary.run_id
                );
                if let Some(report) = report {
                    println!("{report}");
                }
            }
        }
        Command::Report(args) => {
            let report = VerificationReport::collect(&conn)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{report}");
            }
        }
    }
    Ok(())
}

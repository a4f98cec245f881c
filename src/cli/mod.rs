//! Command-line interface.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::errors::DomainError;
use commands::{
    analyze::AnalyzeArgs, catalog::CatalogArgs, form::FormArgs, init::InitArgs, progress::ProgressArgs,
    submit::SubmitArgs, survey::SurveyArgs,
};

#[derive(Parser, Debug)]
#[command(name = "sociogram")]
#[command(about = "Peer-nomination surveys and sociogram analysis", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to .sociogram/config.yaml plus overrides)
    #[arg(short, long, global = true, env = "SOCIOGRAM_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the project directory, default config and database
    Init(InitArgs),
    /// Load reference data handed over by the catalog
    Catalog(CatalogArgs),
    /// Survey lifecycle commands
    Survey(SurveyArgs),
    /// Show the questions and candidates a respondent answers
    Form(FormArgs),
    /// Submit a respondent's answers
    Submit(SubmitArgs),
    /// Completion progress of a cohort or respondent
    Progress(ProgressArgs),
    /// Build the sociogram of a cohort
    Analyze(AnalyzeArgs),
}

/// Print an error and exit with a non-zero status.
///
/// Domain errors keep their category and per-question details in JSON mode.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    let domain = err.downcast_ref::<DomainError>();

    if json_mode {
        let body = match domain {
            Some(domain) => serde_json::json!({
                "error": domain.to_string(),
                "category": domain.category(),
                "answer_errors": domain.answer_errors(),
            }),
            None => serde_json::json!({ "error": format!("{err:#}") }),
        };
        println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else if let Some(domain) = domain.filter(|d| !d.answer_errors().is_empty()) {
        eprintln!("Error ({}): submission rejected", domain.category());
        for answer_error in domain.answer_errors() {
            eprintln!("  - {answer_error}");
        }
    } else {
        eprintln!("Error: {err:#}");
    }

    std::process::exit(1);
}

//! `sociogram survey` - survey lifecycle commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;
use uuid::Uuid;

use super::Repositories;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;

#[derive(Args, Debug)]
pub struct SurveyArgs {
    #[command(subcommand)]
    pub command: SurveyCommands,
}

#[derive(Subcommand, Debug)]
pub enum SurveyCommands {
    /// Create pending completion records for every cohort member
    Open {
        #[arg(long)]
        survey: Uuid,
        #[arg(long)]
        cohort: Uuid,
    },
}

#[derive(Debug, Serialize)]
pub struct SurveyOpenOutput {
    pub survey_id: Uuid,
    pub cohort_id: Uuid,
    pub created: usize,
}

impl CommandOutput for SurveyOpenOutput {
    fn to_human(&self) -> String {
        if self.created == 0 {
            format!("Every member of cohort {} is already tracked.", self.cohort_id)
        } else {
            format!(
                "Survey {} opened for cohort {}: {} pending record(s) created.",
                self.survey_id, self.cohort_id, self.created
            )
        }
    }
}

pub async fn execute(args: SurveyArgs, config: &Config, json_mode: bool) -> Result<()> {
    match args.command {
        SurveyCommands::Open { survey, cohort } => {
            let repos = Repositories::open(config).await?;
            let created = repos.tracker().open_for_cohort(survey, cohort).await?;
            output(&SurveyOpenOutput { survey_id: survey, cohort_id: cohort, created }, json_mode);
        }
    }
    Ok(())
}

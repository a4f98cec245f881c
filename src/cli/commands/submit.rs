//! `sociogram submit` - submit answers read from a JSON file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Repositories;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Answer, AnswerBatch, Config};
use crate::services::SubmissionReceipt;

#[derive(Args, Debug)]
pub struct SubmitArgs {
    #[arg(long)]
    pub survey: Uuid,
    #[arg(long)]
    pub cohort: Uuid,
    #[arg(long)]
    pub respondent: Uuid,
    /// JSON file with a list of answers, or `{"answers": [...]}`
    #[arg(long, short)]
    pub file: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AnswerFile {
    List(Vec<Answer>),
    Wrapped { answers: Vec<Answer> },
}

pub(crate) fn parse_answers(json: &str) -> Result<Vec<Answer>> {
    let file: AnswerFile = serde_json::from_str(json).context("Invalid answers file")?;
    Ok(match file {
        AnswerFile::List(answers) | AnswerFile::Wrapped { answers } => answers,
    })
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct SubmitOutput(pub SubmissionReceipt);

impl CommandOutput for SubmitOutput {
    fn to_human(&self) -> String {
        let completion = &self.0.completion;
        format!(
            "Saved {} answer row(s). Status: {} ({:.2}%)",
            self.0.saved_answers,
            completion.status.as_str(),
            completion.progress
        )
    }
}

pub async fn execute(args: SubmitArgs, config: &Config, json_mode: bool) -> Result<()> {
    let json = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let batch = AnswerBatch {
        survey_id: args.survey,
        cohort_id: args.cohort,
        respondent_id: args.respondent,
        answers: parse_answers(&json)?,
    };

    let repos = Repositories::open(config).await?;
    let receipt = repos.submissions().submit(batch).await?;
    output(&SubmitOutput(receipt), json_mode);
    Ok(())
}

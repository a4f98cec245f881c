//! `sociogram progress` - completion of a cohort or a single respondent.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use uuid::Uuid;

use super::Repositories;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{CohortProgress, CompletionKey, Config, RespondentProgress};

#[derive(Args, Debug)]
pub struct ProgressArgs {
    #[arg(long)]
    pub survey: Uuid,
    #[arg(long)]
    pub cohort: Uuid,
    /// Show one respondent instead of the whole cohort
    #[arg(long)]
    pub respondent: Option<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ProgressOutput {
    Cohort(CohortProgress),
    Respondent(RespondentProgress),
}

impl CommandOutput for ProgressOutput {
    fn to_human(&self) -> String {
        match self {
            Self::Cohort(p) => format!(
                "Cohort {}: {} member(s), {} completed ({:.2}%), {} in progress, {} pending",
                p.cohort_id, p.tracked, p.completed, p.completed_percentage, p.in_progress, p.pending
            ),
            Self::Respondent(p) => {
                let mut line = format!(
                    "Respondent {}: {}/{} question(s) answered, {} ({:.2}%)",
                    p.state.respondent_id,
                    p.answered_questions,
                    p.total_questions,
                    p.state.status.as_str(),
                    p.state.progress
                );
                if let Some(completed_at) = p.state.completed_at {
                    line.push_str(&format!(", completed {}", completed_at.format("%Y-%m-%d %H:%M")));
                }
                line
            }
        }
    }
}

pub async fn execute(args: ProgressArgs, config: &Config, json_mode: bool) -> Result<()> {
    let repos = Repositories::open(config).await?;
    let tracker = repos.tracker();

    let result = match args.respondent {
        Some(respondent) => ProgressOutput::Respondent(
            tracker
                .respondent_progress(CompletionKey::new(args.survey, respondent, args.cohort))
                .await?,
        ),
        None => ProgressOutput::Cohort(tracker.cohort_progress(args.survey, args.cohort).await?),
    };
    output(&result, json_mode);
    Ok(())
}

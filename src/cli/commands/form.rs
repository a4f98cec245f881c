//! `sociogram form` - questions and candidates for one respondent.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use uuid::Uuid;

use super::Repositories;
use crate::cli::output::{list_table, output, short_id, truncate, CommandOutput};
use crate::domain::models::{Config, QuestionKind};
use crate::services::NominationForm;

#[derive(Args, Debug)]
pub struct FormArgs {
    #[arg(long)]
    pub survey: Uuid,
    #[arg(long)]
    pub cohort: Uuid,
    #[arg(long)]
    pub respondent: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct FormOutput(pub NominationForm);

impl CommandOutput for FormOutput {
    fn to_human(&self) -> String {
        let form = &self.0;
        let mut questions = list_table(&["#", "id", "kind", "question", "done"]);
        for entry in &form.questions {
            let q = &entry.question;
            let kind = match &q.kind {
                QuestionKind::Nomination { polarity, max_selections } => {
                    format!("pick {max_selections} ({})", polarity.as_str())
                }
                other => other.as_str().to_string(),
            };
            questions.add_row(vec![
                q.position.to_string(),
                q.id.to_string(),
                kind,
                truncate(&q.text, 60),
                if entry.answered { "yes" } else { "" }.to_string(),
            ]);
        }

        let mut candidates = list_table(&["id", "code", "name"]);
        for member in &form.candidates {
            candidates.add_row(vec![member.id.to_string(), member.code.clone(), member.display_name.clone()]);
        }

        format!(
            "{} (respondent {})\n\n{questions}\n\nCandidates:\n{candidates}",
            form.title,
            short_id(&form.respondent_id)
        )
    }
}

pub async fn execute(args: FormArgs, config: &Config, json_mode: bool) -> Result<()> {
    let repos = Repositories::open(config).await?;
    let form = repos
        .submissions()
        .nomination_form(args.survey, args.cohort, args.respondent)
        .await?;
    output(&FormOutput(form), json_mode);
    Ok(())
}

//! `sociogram catalog` - load reference data from a YAML document.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Repositories;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Cohort, Config, Member, Survey};
use crate::domain::ports::SurveyRepository;

#[derive(Args, Debug)]
pub struct CatalogArgs {
    #[command(subcommand)]
    pub command: CatalogCommands,
}

#[derive(Subcommand, Debug)]
pub enum CatalogCommands {
    /// Insert or update members, cohorts and surveys from a YAML file
    Load {
        /// Catalog document
        file: PathBuf,
    },
}

/// Cohort as written in a catalog file; members are referenced by code.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogCohort {
    pub id: Uuid,
    pub label: String,
    #[serde(default)]
    pub members: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogSurvey {
    #[serde(flatten)]
    pub survey: Survey,
    /// Cohorts eligible to answer
    #[serde(default)]
    pub cohorts: Vec<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogDocument {
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub cohorts: Vec<CatalogCohort>,
    #[serde(default)]
    pub surveys: Vec<CatalogSurvey>,
}

impl CatalogDocument {
    pub fn parse(yaml: &str) -> Result<Self> {
        let mut document: Self = serde_yaml::from_str(yaml).context("Invalid catalog document")?;
        for entry in &mut document.surveys {
            entry.survey.questions.sort_by_key(|q| q.position);
        }
        Ok(document)
    }

    /// Resolve member codes into cohort membership.
    pub fn cohorts(&self) -> Result<Vec<Cohort>> {
        let by_code: HashMap<&str, Uuid> = self.members.iter().map(|m| (m.code.as_str(), m.id)).collect();

        self.cohorts
            .iter()
            .map(|c| {
                let mut member_ids = Vec::with_capacity(c.members.len());
                for code in &c.members {
                    let Some(id) = by_code.get(code.as_str()) else {
                        bail!("cohort '{}' references unknown member code '{code}'", c.label);
                    };
                    member_ids.push(*id);
                }
                Ok(Cohort { id: c.id, label: c.label.clone(), member_ids })
            })
            .collect()
    }
}

#[derive(Debug, Serialize)]
pub struct CatalogLoadOutput {
    pub members: usize,
    pub cohorts: usize,
    pub surveys: usize,
    pub assignments: usize,
}

impl CommandOutput for CatalogLoadOutput {
    fn to_human(&self) -> String {
        format!(
            "Loaded {} member(s), {} cohort(s), {} survey(s), {} cohort assignment(s).",
            self.members, self.cohorts, self.surveys, self.assignments
        )
    }
}

pub async fn execute(args: CatalogArgs, config: &Config, json_mode: bool) -> Result<()> {
    match args.command {
        CatalogCommands::Load { file } => {
            let yaml = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let document = CatalogDocument::parse(&yaml)?;
            let cohorts = document.cohorts()?;

            let repos = Repositories::open(config).await?;
            let surveys = &repos.surveys;

            for member in &document.members {
                surveys.save_member(member).await?;
            }
            for cohort in &cohorts {
                surveys.save_cohort(cohort).await?;
            }
            let mut assignments = 0;
            for entry in &document.surveys {
                surveys.save_survey(&entry.survey).await?;
                for cohort_id in &entry.cohorts {
                    surveys.assign_cohort(entry.survey.id, *cohort_id).await?;
                    assignments += 1;
                }
            }

            tracing::info!(
                members = document.members.len(),
                cohorts = cohorts.len(),
                surveys = document.surveys.len(),
                "Catalog loaded"
            );

            output(
                &CatalogLoadOutput {
                    members: document.members.len(),
                    cohorts: cohorts.len(),
                    surveys: document.surveys.len(),
                    assignments,
                },
                json_mode,
            );
        }
    }
    Ok(())
}

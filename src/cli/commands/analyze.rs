//! `sociogram analyze` - build and print the sociogram of a cohort.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use uuid::Uuid;

use super::Repositories;
use crate::cli::output::{list_table, output, truncate, CommandOutput};
use crate::domain::models::{Config, EdgeStrength, Sociogram};

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    #[arg(long)]
    pub survey: Uuid,
    /// Analyze one cohort; every assigned cohort when omitted
    #[arg(long)]
    pub cohort: Option<Uuid>,
    /// Only list strong edges
    #[arg(long)]
    pub strong_only: bool,
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct AnalyzeOutput {
    pub sociogram: Sociogram,
}

impl AnalyzeOutput {
    fn name_of(&self, id: Uuid) -> String {
        self.sociogram
            .node(id)
            .map_or_else(|| id.to_string(), |n| truncate(&n.display_name, 24))
    }
}

impl CommandOutput for AnalyzeOutput {
    fn to_human(&self) -> String {
        let s = &self.sociogram;

        let mut nodes = list_table(&["code", "name", "+", "-", "impact", "in", "out", "category", "done"]);
        for n in &s.nodes {
            nodes.add_row(vec![
                n.code.clone(),
                truncate(&n.display_name, 24),
                n.positive.to_string(),
                n.negative.to_string(),
                n.impact.to_string(),
                n.in_degree.to_string(),
                n.out_degree.to_string(),
                n.category.as_str().to_string(),
                if n.completed { "yes" } else { "" }.to_string(),
            ]);
        }

        let mut edges = list_table(&["from", "to", "weight", "%", "strength", "polarity", "mutual"]);
        for e in &s.edges {
            edges.add_row(vec![
                self.name_of(e.origin_id),
                self.name_of(e.destination_id),
                e.weight.to_string(),
                format!("{:.2}", e.percentage),
                e.strength.as_str().to_string(),
                e.polarity.as_str().to_string(),
                if e.mutual { e.mutual_points.to_string() } else { String::new() },
            ]);
        }

        format!(
            "Cohort {}: {}/{} completed, max impact {}, total possible {}\n\
             accepted {}, rejected {}, invisible {}\n\n{nodes}\n\nEdges:\n{edges}",
            s.cohort_label,
            s.completed_members,
            s.total_members,
            s.max_impact,
            s.total_possible,
            s.categories.accepted,
            s.categories.rejected,
            s.categories.invisible,
        )
    }
}

/// Sociograms of every cohort of a survey.
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct AnalyzeAllOutput {
    pub cohorts: Vec<AnalyzeOutput>,
}

impl CommandOutput for AnalyzeAllOutput {
    fn to_human(&self) -> String {
        if self.cohorts.is_empty() {
            return "No cohorts are assigned to this survey.".to_string();
        }
        self.cohorts.iter().map(AnalyzeOutput::to_human).collect::<Vec<_>>().join("\n\n")
    }
}

pub async fn execute(args: AnalyzeArgs, config: &Config, json_mode: bool) -> Result<()> {
    let repos = Repositories::open(config).await?;
    let service = repos.sociograms(config);

    let strong_only = args.strong_only;
    let prepare = |mut sociogram: Sociogram| {
        if strong_only {
            sociogram.edges.retain(|e| e.strength == EdgeStrength::Strong);
        }
        AnalyzeOutput { sociogram }
    };

    match args.cohort {
        Some(cohort) => output(&prepare(service.build(args.survey, cohort).await?), json_mode),
        None => {
            let cohorts = service.build_all(args.survey).await?.into_iter().map(prepare).collect();
            output(&AnalyzeAllOutput { cohorts }, json_mode);
        }
    }
    Ok(())
}

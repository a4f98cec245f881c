//! Builds the per-cohort sociogram payload.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::instrument;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{AnalysisConfig, CategoryCounts, SociometricNode, Sociogram, Survey};
use crate::domain::ports::{CompletionRepository, ResponseRepository, SurveyRepository};
use crate::services::classifier::Classifier;
use crate::services::graph_aggregator::GraphAggregator;

/// Read-only: loads the cohort's responses once, aggregates and classifies.
pub struct SociogramService<S, R, C>
where
    S: SurveyRepository,
    R: ResponseRepository,
    C: CompletionRepository,
{
    surveys: Arc<S>,
    responses: Arc<R>,
    completions: Arc<C>,
    aggregator: GraphAggregator,
    classifier: Classifier,
}

impl<S, R, C> SociogramService<S, R, C>
where
    S: SurveyRepository,
    R: ResponseRepository,
    C: CompletionRepository,
{
    pub fn new(surveys: Arc<S>, responses: Arc<R>, completions: Arc<C>, config: &AnalysisConfig) -> Self {
        Self {
            surveys,
            responses,
            completions,
            aggregator: GraphAggregator::new(config.strong_edge_percentage),
            classifier: Classifier::from_config(config),
        }
    }

    async fn load_survey(&self, survey_id: Uuid) -> DomainResult<Survey> {
        self.surveys
            .get_survey(survey_id)
            .await?
            .ok_or(DomainError::SurveyNotFound(survey_id))
    }

    #[instrument(skip(self))]
    pub async fn build(&self, survey_id: Uuid, cohort_id: Uuid) -> DomainResult<Sociogram> {
        let survey = self.load_survey(survey_id).await?;
        self.build_for(&survey, cohort_id).await
    }

    /// One sociogram per cohort assigned to the survey.
    #[instrument(skip(self))]
    pub async fn build_all(&self, survey_id: Uuid) -> DomainResult<Vec<Sociogram>> {
        let survey = self.load_survey(survey_id).await?;
        let cohort_ids = self.surveys.list_survey_cohorts(survey_id).await?;

        let mut sociograms = Vec::with_capacity(cohort_ids.len());
        for cohort_id in cohort_ids {
            sociograms.push(self.build_for(&survey, cohort_id).await?);
        }
        Ok(sociograms)
    }

    async fn build_for(&self, survey: &Survey, cohort_id: Uuid) -> DomainResult<Sociogram> {
        let survey_id = survey.id;
        let snapshot = self
            .surveys
            .get_cohort_snapshot(survey_id, cohort_id)
            .await?
            .ok_or(DomainError::CohortNotFound { survey_id, cohort_id })?;

        let member_ids: Vec<Uuid> = snapshot.members().iter().map(|m| m.id).collect();
        let responses = self.responses.list_nominations(survey_id, &member_ids).await?;
        let completed: HashSet<Uuid> = self
            .completions
            .list_for_cohort(survey_id, cohort_id)
            .await?
            .into_iter()
            .filter(|s| s.status.is_completed())
            .map(|s| s.respondent_id)
            .collect();

        let aggregation = self.aggregator.aggregate(survey, &snapshot, &responses);

        let mut categories = CategoryCounts::default();
        let nodes: Vec<SociometricNode> = snapshot
            .members()
            .iter()
            .zip(&aggregation.tallies)
            .map(|(member, tally)| {
                let category = self.classifier.classify_tally(tally, aggregation.max_impact);
                categories.record(category);
                SociometricNode {
                    member_id: member.id,
                    code: member.code.clone(),
                    display_name: member.display_name.clone(),
                    positive: tally.positive,
                    negative: tally.negative,
                    impact: tally.impact,
                    in_degree: tally.in_degree,
                    out_degree: tally.out_degree,
                    category,
                    completed: completed.contains(&member.id),
                }
            })
            .collect();

        let completed_members = nodes.iter().filter(|n| n.completed).count();
        tracing::info!(
            members = nodes.len(),
            edges = aggregation.edges.len(),
            accepted = categories.accepted,
            rejected = categories.rejected,
            invisible = categories.invisible,
            cohort_id = %cohort_id,
            "Built sociogram"
        );

        Ok(Sociogram {
            survey_id,
            cohort_id,
            cohort_label: snapshot.label.clone(),
            total_members: snapshot.len(),
            completed_members,
            max_impact: aggregation.max_impact,
            total_possible: aggregation.total_possible,
            categories,
            nodes,
            edges: aggregation.edges,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{
        create_migrated_test_pool, SqliteCompletionRepository, SqliteResponseRepository, SqliteSubmissionStore,
        SqliteSurveyRepository,
    };
    use crate::domain::models::{
        Category, Cohort, CompletionKey, CompletionState, Member, NewResponse, Polarity, Question, Survey,
    };
    use crate::domain::ports::SubmissionStore;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_build_classifies_every_member() {
        let pool = create_migrated_test_pool().await.unwrap();
        let surveys = SqliteSurveyRepository::new(pool.clone());
        let completions = SqliteCompletionRepository::new(pool.clone());
        let store = SqliteSubmissionStore::new(pool.clone());
        let now = Utc::now();

        let survey = Survey::new("Climate", now - Duration::days(1), now + Duration::days(1))
            .with_question(Question::nomination(1, "Work with?", Polarity::Positive, 1))
            .with_question(Question::nomination(2, "Avoid?", Polarity::Negative, 1));
        surveys.save_survey(&survey).await.unwrap();
        let members: Vec<Member> = ["A", "B", "C"].iter().map(|c| Member::new(*c, *c)).collect();
        for m in &members {
            surveys.save_member(m).await.unwrap();
        }
        let cohort = Cohort::new("1A").with_members(members.iter().map(|m| m.id));
        surveys.save_cohort(&cohort).await.unwrap();
        surveys.assign_cohort(survey.id, cohort.id).await.unwrap();

        let (a, b, c) = (members[0].id, members[1].id, members[2].id);
        let mut tx = store.begin().await.unwrap();
        for (question, from, to) in [(0, a, b), (1, a, c), (0, c, b)] {
            let q = survey.questions[question].id;
            let row = NewResponse::Nomination { target_id: to, rank: 1, score: 1 }.into_response(survey.id, from, q, now);
            tx.replace_answers(survey.id, from, q, &[row]).await.unwrap();
        }
        let mut done = CompletionState::pending(CompletionKey::new(survey.id, a, cohort.id), now);
        done.apply_progress(2, 2, now);
        tx.save_completion(&done).await.unwrap();
        tx.commit().await.unwrap();

        let service = SociogramService::new(
            Arc::new(surveys),
            Arc::new(SqliteResponseRepository::new(pool)),
            Arc::new(completions),
            &AnalysisConfig::default(),
        );
        let sociogram = service.build(survey.id, cohort.id).await.unwrap();

        assert_eq!(sociogram.total_members, 3);
        assert_eq!(sociogram.completed_members, 1);
        assert_eq!(sociogram.categories.total(), 3);
        assert_eq!(sociogram.node(a).unwrap().category, Category::Invisible);
        assert_eq!(sociogram.node(b).unwrap().category, Category::Accepted);
        assert_eq!(sociogram.node(c).unwrap().category, Category::Rejected);
        assert!(sociogram.node(a).unwrap().completed);
        assert_eq!(sociogram.edges.len(), 3);
    }
}

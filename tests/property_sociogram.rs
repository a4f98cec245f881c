use chrono::{Duration, Utc};
use proptest::prelude::*;
use uuid::Uuid;

use sociogram::domain::models::{
    Category, CohortSnapshot, CompletionKey, CompletionState, CompletionStatus, Member, NewResponse, Polarity,
    Question, Response, Survey,
};
use sociogram::services::{nomination_score, Classifier, GraphAggregator};

fn survey(max_positive: u32, max_negative: u32) -> Survey {
    let now = Utc::now();
    Survey::new("Climate", now - Duration::days(1), now + Duration::days(1))
        .with_question(Question::nomination(1, "Work with?", Polarity::Positive, max_positive))
        .with_question(Question::nomination(2, "Avoid?", Polarity::Negative, max_negative))
}

fn snapshot(survey: &Survey, size: usize) -> CohortSnapshot {
    let members = (0..size).map(|i| Member::new(format!("M{i}"), format!("Member {i}"))).collect();
    CohortSnapshot::new(survey.id, Uuid::new_v4(), "1A", members)
}

/// Turn `(question, origin, destination, rank)` picks into stored rows.
fn responses(survey: &Survey, snapshot: &CohortSnapshot, picks: &[(usize, usize, usize, u32)]) -> Vec<Response> {
    let now = Utc::now();
    let ids: Vec<Uuid> = snapshot.members().iter().map(|m| m.id).collect();
    picks
        .iter()
        .filter(|(_, from, to, _)| from != to)
        .map(|&(question, from, to, rank)| {
            let q = &survey.questions[question % 2];
            let max = q.kind.nomination_rule().map_or(1, |r| r.max_selections);
            let rank = rank.min(max).max(1);
            NewResponse::Nomination { target_id: ids[to], rank, score: nomination_score(rank, max) }
                .into_response(survey.id, ids[from], q.id, now)
        })
        .collect()
}

fn picks_strategy(size: usize) -> impl Strategy<Value = Vec<(usize, usize, usize, u32)>> {
    prop::collection::vec((0usize..2, 0..size, 0..size, 1u32..6), 0..40)
}

proptest! {
    /// Property: score is positive and strictly decreases with rank inside 1..=max
    #[test]
    fn prop_score_decreases_with_rank(max in 1u32..20) {
        for rank in 1..=max {
            let score = nomination_score(rank, max);
            prop_assert_eq!(score, max - rank + 1);
            if rank > 1 {
                prop_assert!(score < nomination_score(rank - 1, max));
            }
        }
        prop_assert_eq!(nomination_score(max + 5, max), 1);
    }

    /// Property: every member lands in exactly one category
    #[test]
    fn prop_categories_partition_cohort(
        (size, picks) in (2usize..12).prop_flat_map(|size| (Just(size), picks_strategy(size)))
    ) {
        let survey = survey(3, 2);
        let snapshot = snapshot(&survey, size);
        let rows = responses(&survey, &snapshot, &picks);
        let aggregation = GraphAggregator::default().aggregate(&survey, &snapshot, &rows);
        let classifier = Classifier::default();

        let categories: Vec<Category> = aggregation
            .tallies
            .iter()
            .map(|t| classifier.classify_tally(t, aggregation.max_impact))
            .collect();
        prop_assert_eq!(categories.len(), size);

        for (tally, category) in aggregation.tallies.iter().zip(&categories) {
            prop_assert_eq!(tally.impact, tally.positive + tally.negative);
            if tally.impact == 0 {
                prop_assert_eq!(*category, Category::Invisible);
            }
        }
    }

    /// Property: aggregation is deterministic and edge totals match tallies
    #[test]
    fn prop_aggregation_is_consistent(
        (size, picks) in (2usize..10).prop_flat_map(|size| (Just(size), picks_strategy(size)))
    ) {
        let survey = survey(3, 3);
        let snapshot = snapshot(&survey, size);
        let rows = responses(&survey, &snapshot, &picks);
        let aggregator = GraphAggregator::default();

        let first = aggregator.aggregate(&survey, &snapshot, &rows);
        let second = aggregator.aggregate(&survey, &snapshot, &rows);
        prop_assert_eq!(&first, &second);

        let edge_weight: u64 = first.edges.iter().map(|e| e.weight).sum();
        let received: u64 = first.tallies.iter().map(|t| t.impact).sum();
        prop_assert_eq!(edge_weight, received);

        for edge in &first.edges {
            prop_assert_eq!(edge.weight, edge.positive_weight + edge.negative_weight);
            prop_assert!(edge.mutual_points >= edge.weight);
            prop_assert!(edge.origin_id != edge.destination_id);
        }
    }

    /// Property: completion never regresses from started, and completed_at sticks once set
    #[test]
    fn prop_completion_timestamps_are_sticky(
        total in 1usize..8,
        steps in prop::collection::vec(0usize..10, 1..12)
    ) {
        let start = Utc::now();
        let mut state = CompletionState::pending(CompletionKey::new(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()), start);
        let mut answered = 0usize;
        let mut completed_at = None;

        for (i, step) in steps.iter().enumerate() {
            answered = (answered + step).min(total);
            let now = start + Duration::seconds(i64::try_from(i).unwrap_or(0) + 1);
            state.apply_progress(answered, total, now);

            prop_assert!(state.progress >= 0.0 && state.progress <= 100.0);
            if answered > 0 {
                prop_assert!(state.started_at.is_some());
            }
            if state.status == CompletionStatus::Completed {
                completed_at = completed_at.or(state.completed_at);
            }
            if completed_at.is_some() {
                prop_assert_eq!(state.completed_at, completed_at);
            }
        }
    }
}

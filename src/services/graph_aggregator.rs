//! Batch aggregation of nomination responses into a weighted digraph.
//!
//! Works on plain slices loaded once per call: members are addressed by their
//! position in the cohort snapshot, pairs by `(origin, destination)` positions.
//! Nothing is cached across calls.

use std::collections::{BTreeMap, HashMap};

use uuid::Uuid;

use crate::domain::models::completion::round2;
use crate::domain::models::{
    CohortSnapshot, EdgeStrength, NominationRule, Polarity, Response, SociometricEdge, Survey,
};
use crate::services::scoring::nomination_score;

/// Received and cast nomination totals of one member.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemberTally {
    pub positive: u64,
    pub negative: u64,
    pub impact: u64,
    pub in_degree: u64,
    pub out_degree: u64,
}

/// Aggregator output, in snapshot order.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    /// One entry per snapshot member, same order as `CohortSnapshot::members`.
    pub tallies: Vec<MemberTally>,
    pub edges: Vec<SociometricEdge>,
    pub max_impact: u64,
    pub total_possible: u64,
}

#[derive(Debug, Clone, Copy)]
struct EdgeAccumulator {
    weight: u64,
    positive_weight: u64,
    negative_weight: u64,
    /// Position of the earliest question that produced the edge, with its polarity.
    first_question: (u32, Polarity),
}

#[derive(Debug, Clone)]
pub struct GraphAggregator {
    strong_edge_percentage: f64,
}

impl Default for GraphAggregator {
    fn default() -> Self {
        Self::new(33.0)
    }
}

impl GraphAggregator {
    pub fn new(strong_edge_percentage: f64) -> Self {
        Self { strong_edge_percentage }
    }

    /// Sum over nomination questions of `cohort_size * max_selections^2`.
    pub fn total_possible(survey: &Survey, cohort_size: usize) -> u64 {
        survey
            .nomination_questions()
            .map(|(_, rule)| {
                let max = u64::from(rule.max_selections);
                cohort_size as u64 * max * max
            })
            .sum()
    }

    /// Aggregate every nomination whose respondent and target are both in the snapshot.
    pub fn aggregate(&self, survey: &Survey, snapshot: &CohortSnapshot, responses: &[Response]) -> Aggregation {
        let rules: HashMap<Uuid, (u32, NominationRule)> = survey
            .nomination_questions()
            .map(|(q, rule)| (q.id, (q.position, rule)))
            .collect();

        let mut tallies = vec![MemberTally::default(); snapshot.len()];
        let mut pairs: BTreeMap<(usize, usize), EdgeAccumulator> = BTreeMap::new();
        let mut skipped = 0usize;

        for response in responses {
            let Some(&(position, rule)) = rules.get(&response.question_id) else {
                continue;
            };
            let (Some(origin), Some(destination)) = (
                snapshot.position(response.respondent_id),
                response.target_id.and_then(|t| snapshot.position(t)),
            ) else {
                skipped += 1;
                continue;
            };

            let points = response_points(response, rule);

            let target = &mut tallies[destination];
            match rule.polarity {
                Polarity::Positive => target.positive += points,
                Polarity::Negative => target.negative += points,
            }
            target.in_degree += 1;
            tallies[origin].out_degree += 1;

            let edge = pairs.entry((origin, destination)).or_insert(EdgeAccumulator {
                weight: 0,
                positive_weight: 0,
                negative_weight: 0,
                first_question: (position, rule.polarity),
            });
            edge.weight += points;
            match rule.polarity {
                Polarity::Positive => edge.positive_weight += points,
                Polarity::Negative => edge.negative_weight += points,
            }
            if position < edge.first_question.0 {
                edge.first_question = (position, rule.polarity);
            }
        }

        for tally in &mut tallies {
            tally.impact = tally.positive + tally.negative;
        }
        let max_impact = tallies.iter().map(|t| t.impact).max().unwrap_or(0);
        let total_possible = Self::total_possible(survey, snapshot.len());

        let members = snapshot.members();
        let edges = pairs
            .iter()
            .map(|(&(origin, destination), acc)| {
                let reverse = pairs.get(&(destination, origin));
                let mutual_points = acc.weight + reverse.map_or(0, |r| r.weight);
                let share = if total_possible == 0 {
                    0.0
                } else {
                    mutual_points as f64 / total_possible as f64 * 100.0
                };
                // Strength is judged on the unrounded share.
                let percentage = round2(share);
                let strength = if share >= self.strong_edge_percentage {
                    EdgeStrength::Strong
                } else {
                    EdgeStrength::Weak
                };

                SociometricEdge {
                    origin_id: members[origin].id,
                    destination_id: members[destination].id,
                    weight: acc.weight,
                    positive_weight: acc.positive_weight,
                    negative_weight: acc.negative_weight,
                    mutual: reverse.is_some(),
                    mutual_points,
                    percentage,
                    strength,
                    polarity: acc.first_question.1,
                }
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            members = snapshot.len(),
            edges = edges.len(),
            skipped,
            max_impact,
            total_possible,
            "Aggregated nominations"
        );

        Aggregation {
            tallies,
            edges,
            max_impact,
            total_possible,
        }
    }
}

/// Stored score, or the score its rank implies; 1 when neither is present.
fn response_points(response: &Response, rule: NominationRule) -> u64 {
    response
        .score
        .or_else(|| response.rank.map(|rank| nomination_score(rank, rule.max_selections)))
        .map_or(1, u64::from)
}

//! Sociometric category assignment.

use crate::domain::models::{AnalysisConfig, Category, TieBreak};
use crate::services::graph_aggregator::MemberTally;

/// Assigns every member exactly one of accepted, rejected or invisible.
///
/// A member whose impact is at or below `max_impact * invisible_ratio` is
/// invisible; otherwise the dominant polarity decides, with `tie_break`
/// settling equal scores.
#[derive(Debug, Clone, Copy)]
pub struct Classifier {
    invisible_ratio: f64,
    tie_break: TieBreak,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

impl Classifier {
    pub fn new(invisible_ratio: f64, tie_break: TieBreak) -> Self {
        Self { invisible_ratio, tie_break }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.invisible_ratio, config.tie_break)
    }

    pub fn invisible_threshold(&self, max_impact: u64) -> f64 {
        max_impact as f64 * self.invisible_ratio
    }

    pub fn classify(&self, positive: u64, negative: u64, impact: u64, max_impact: u64) -> Category {
        if impact as f64 <= self.invisible_threshold(max_impact) {
            return Category::Invisible;
        }
        match positive.cmp(&negative) {
            std::cmp::Ordering::Greater => Category::Accepted,
            std::cmp::Ordering::Less => Category::Rejected,
            std::cmp::Ordering::Equal => match self.tie_break {
                TieBreak::Accepted => Category::Accepted,
                TieBreak::Rejected => Category::Rejected,
            },
        }
    }

    pub fn classify_tally(&self, tally: &MemberTally, max_impact: u64) -> Category {
        self.classify(tally.positive, tally.negative, tally.impact, max_impact)
    }
}

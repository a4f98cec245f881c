//! Derived sociogram payload. Computed on demand, never persisted.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::survey::Polarity;

/// Sociometric classification of a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Accepted,
    Rejected,
    Invisible,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Invisible => "invisible",
        }
    }
}

/// Edge strength relative to the cohort's maximum possible point mass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeStrength {
    Strong,
    Weak,
}

impl EdgeStrength {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strong => "strong",
            Self::Weak => "weak",
        }
    }
}

/// One member of the cohort with received scores and its category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SociometricNode {
    pub member_id: Uuid,
    pub code: String,
    pub display_name: String,
    pub positive: u64,
    pub negative: u64,
    pub impact: u64,
    /// Nominations received.
    pub in_degree: u64,
    /// Nominations cast.
    pub out_degree: u64,
    pub category: Category,
    pub completed: bool,
}

/// Directed, weighted nomination relation between two members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SociometricEdge {
    pub origin_id: Uuid,
    pub destination_id: Uuid,
    /// Summed score across all nomination questions.
    pub weight: u64,
    pub positive_weight: u64,
    pub negative_weight: u64,
    pub mutual: bool,
    /// This edge's weight plus the reverse edge's weight when mutual.
    pub mutual_points: u64,
    pub percentage: f64,
    pub strength: EdgeStrength,
    /// Polarity of the earliest question that produced this edge.
    pub polarity: Polarity,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCounts {
    pub accepted: usize,
    pub rejected: usize,
    pub invisible: usize,
}

impl CategoryCounts {
    pub fn record(&mut self, category: Category) {
        match category {
            Category::Accepted => self.accepted += 1,
            Category::Rejected => self.rejected += 1,
            Category::Invisible => self.invisible += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.accepted + self.rejected + self.invisible
    }
}

/// Sociogram of one cohort for one survey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sociogram {
    pub survey_id: Uuid,
    pub cohort_id: Uuid,
    pub cohort_label: String,
    pub total_members: usize,
    pub completed_members: usize,
    pub max_impact: u64,
    pub total_possible: u64,
    pub categories: CategoryCounts,
    pub nodes: Vec<SociometricNode>,
    pub edges: Vec<SociometricEdge>,
}

impl Sociogram {
    pub fn node(&self, member_id: Uuid) -> Option<&SociometricNode> {
        self.nodes.iter().find(|n| n.member_id == member_id)
    }

    pub fn edge(&self, origin_id: Uuid, destination_id: Uuid) -> Option<&SociometricEdge> {
        self.edges
            .iter()
            .find(|e| e.origin_id == origin_id && e.destination_id == destination_id)
    }
}

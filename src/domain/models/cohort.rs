//! Cohort membership models.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A person who can answer surveys and be nominated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: Uuid,
    /// External identifier (enrollment number, employee code, ...)
    pub code: String,
    pub display_name: String,
}

impl Member {
    pub fn new(code: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            code: code.into(),
            display_name: display_name.into(),
        }
    }
}

/// A fixed group of members, as handed over by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cohort {
    pub id: Uuid,
    pub label: String,
    #[serde(default)]
    pub member_ids: Vec<Uuid>,
}

impl Cohort {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: label.into(),
            member_ids: Vec::new(),
        }
    }

    pub fn with_members(mut self, members: impl IntoIterator<Item = Uuid>) -> Self {
        self.member_ids.extend(members);
        self
    }
}

/// Frozen membership of one cohort for one survey.
///
/// Built once per request and never refreshed; every lookup during a
/// validation or aggregation call sees the same member set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CohortSnapshot {
    pub survey_id: Uuid,
    pub cohort_id: Uuid,
    pub label: String,
    members: Vec<Member>,
    index: HashMap<Uuid, usize>,
}

impl CohortSnapshot {
    pub fn new(survey_id: Uuid, cohort_id: Uuid, label: impl Into<String>, members: Vec<Member>) -> Self {
        let mut deduped: Vec<Member> = Vec::with_capacity(members.len());
        let mut index = HashMap::with_capacity(members.len());
        for member in members {
            if !index.contains_key(&member.id) {
                index.insert(member.id, deduped.len());
                deduped.push(member);
            }
        }
        Self {
            survey_id,
            cohort_id,
            label: label.into(),
            members: deduped,
            index,
        }
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn contains(&self, member_id: Uuid) -> bool {
        self.index.contains_key(&member_id)
    }

    /// Position of a member in [`Self::members`].
    pub fn position(&self, member_id: Uuid) -> Option<usize> {
        self.index.get(&member_id).copied()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_ignores_duplicate_members() {
        let ana = Member::new("A001", "Ana");
        let snapshot = CohortSnapshot::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "1A",
            vec![ana.clone(), Member::new("B002", "Bruno"), ana.clone()],
        );

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.position(ana.id), Some(0));
        assert!(!snapshot.contains(Uuid::new_v4()));
    }
}

//! The Event Classifier: partitions the caller's event-commit inputs into
//! the four kinds and validates them against the graph.

use std::collections::{HashMap, HashSet};

use crate::error::AnalyzeError;
use crate::oid::CommitId;

/// The four disjoint labels a commit may carry, as far as the analyzer is
/// concerned. Exhaustive, so that a future fifth kind is a compile error
/// everywhere this is matched on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Introduced,
    Fixed,
    LastAffected,
    Limit,
}

/// The normalized, validated event sets for a single `analyze()` call.
#[derive(Debug, Default)]
pub struct EventSets {
    pub introduced: HashSet<CommitId>,
    pub fixed: HashSet<CommitId>,
    pub last_affected: HashSet<CommitId>,
    pub limit: HashSet<CommitId>,
}

impl EventSets {
    /// Validates and normalizes the four input lists: every ID must be
    /// present in `known_commits`, and no commit may appear under more than
    /// one kind.
    pub fn classify(
        known_commits: &HashSet<CommitId>,
        introduced: &[CommitId],
        fixed: &[CommitId],
        last_affected: &[CommitId],
        limit: &[CommitId],
    ) -> Result<Self, AnalyzeError> {
        let mut kind_of: HashMap<CommitId, EventKind> = HashMap::new();
        let mut sets = Self::default();

        for (kind, ids) in [
            (EventKind::Introduced, introduced),
            (EventKind::Fixed, fixed),
            (EventKind::LastAffected, last_affected),
            (EventKind::Limit, limit),
        ] {
            for &id in ids {
                if !known_commits.contains(&id) {
                    return Err(AnalyzeError::UnknownCommit(id));
                }
                match kind_of.get(&id) {
                    Some(&existing) if existing != kind => {
                        return Err(AnalyzeError::ConflictingEvent(id));
                    }
                    Some(_) => {}
                    None => {
                        kind_of.insert(id, kind);
                    }
                }
                match kind {
                    EventKind::Introduced => sets.introduced.insert(id),
                    EventKind::Fixed => sets.fixed.insert(id),
                    EventKind::LastAffected => sets.last_affected.insert(id),
                    EventKind::Limit => sets.limit.insert(id),
                };
            }
        }

        Ok(sets)
    }
}

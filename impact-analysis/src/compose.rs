//! The Result Composer: unions the resolver and detector outputs into a
//! final commit set, and derives contiguous commit ranges from it.

use std::collections::{HashMap, HashSet};

use itertools::Itertools;
use tracing::instrument;

use crate::error::AnalyzeError;
use crate::graph::{ChildIndex, CommitGraph};
use crate::oid::CommitId;

/// The final output of an `analyze()` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AffectedResult {
    pub commits: HashSet<CommitId>,
    pub ranges: Vec<CommitRange>,
}

/// A contiguous affected sub-chain, `start` reachable from no other
/// affected commit and `end` reached by no further affected commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommitRange {
    pub start: CommitId,
    pub end: CommitId,
}

/// Walks `v` in topological order and emits one [`CommitRange`] per maximal
/// run of affected commits reaching a "leaf" (a commit in `v` with no
/// affected child) from a "root" (a commit in `v` with no affected parent).
/// A merge where multiple affected ancestries converge can make a single
/// commit the end of more than one range, one per ancestry that reaches it.
#[instrument(skip(graph, index, v))]
pub fn build_ranges(
    graph: &dyn CommitGraph,
    index: &ChildIndex,
    v: &HashSet<CommitId>,
) -> Result<Vec<CommitRange>, AnalyzeError> {
    let order = index.topological_order(graph, v)?;

    let mut roots_reaching: HashMap<CommitId, HashSet<CommitId>> = HashMap::with_capacity(v.len());
    for &commit in &order {
        let affected_parents: Vec<CommitId> = graph
            .parents(commit)
            .map_err(AnalyzeError::from)?
            .into_iter()
            .filter(|parent| v.contains(parent))
            .collect();

        let roots = if affected_parents.is_empty() {
            HashSet::from([commit])
        } else {
            let mut roots = HashSet::new();
            for parent in &affected_parents {
                roots.extend(roots_reaching.get(parent).into_iter().flatten().copied());
            }
            roots
        };
        roots_reaching.insert(commit, roots);
    }

    let mut ranges = Vec::new();
    for &commit in &order {
        let has_affected_child = index.children_of(commit).iter().any(|child| v.contains(child));
        if has_affected_child {
            continue;
        }
        let Some(roots) = roots_reaching.get(&commit) else {
            continue;
        };
        let roots = roots.iter().copied().sorted_by_key(|commit| commit.to_string());
        for start in roots {
            ranges.push(CommitRange { start, end: commit });
        }
    }
    Ok(ranges)
}

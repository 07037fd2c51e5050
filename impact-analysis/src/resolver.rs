//! The Range Resolver: the core of the analyzer. Computes the vulnerable
//! reachable set `V` from the event sets produced by the classifier.

use std::collections::{HashMap, HashSet};

use tracing::{debug, instrument, trace};

use crate::cancellation::CancellationToken;
use crate::error::AnalyzeError;
use crate::events::EventSets;
use crate::graph::{ChildIndex, CommitGraph};
use crate::oid::CommitId;

/// Computes `V`, the set of affected commits, from the seed cone of the
/// introduced commits and the three terminator kinds.
#[instrument(skip(graph, index, events, cancellation))]
pub fn resolve(
    graph: &dyn CommitGraph,
    index: &ChildIndex,
    events: &EventSets,
    cancellation: &CancellationToken,
) -> Result<HashSet<CommitId>, AnalyzeError> {
    let introduced: Vec<CommitId> = events.introduced.iter().copied().collect();
    let last_affected: Vec<CommitId> = events.last_affected.iter().copied().collect();

    let seed = index.descendants_of(&introduced);
    trace!(seed_size = seed.len(), "seed set computed");

    let affected_by_fix = propagate_fix(graph, index, &seed, events, cancellation)?;

    let exclude_limit: HashSet<CommitId> = {
        let reachable_avoiding_limits = index.reachable_forward_avoiding(&introduced, &events.limit);
        seed.iter()
            .copied()
            .filter(|commit| !reachable_avoiding_limits.contains(commit))
            .collect()
    };

    let mut exclude_last_affected: HashSet<CommitId> = HashSet::new();
    for &last_affected_commit in &last_affected {
        let mut strict_descendants = index.descendants_of(&[last_affected_commit]);
        strict_descendants.remove(&last_affected_commit);
        exclude_last_affected.extend(strict_descendants);
    }

    let v: HashSet<CommitId> = affected_by_fix
        .into_iter()
        .filter(|commit| !exclude_limit.contains(commit) && !exclude_last_affected.contains(commit))
        .collect();

    debug!(affected = v.len(), "range resolution complete");
    Ok(v)
}

/// Determines, for every commit in `seed`, whether it still carries the
/// vulnerability once `fixed` events are taken into account.
///
/// A commit is excluded if it is itself fixed; included if it is itself
/// introduced (this overrides everything else, so a later re-introduction on
/// top of a fix stays affected); otherwise it is healed by a merge parent
/// that falls anywhere in a fixed commit's descendant cone — computed over
/// the whole graph, not just `seed`, since the parent bringing the fix in
/// may live on a branch the introduced commit never reaches — and failing
/// that, affected if any of its in-`seed` parents is. The merge-healing
/// check comes before the ordinary parent check, so a merge with a fixed
/// ancestor on one side is excluded even when its other parent is still
/// independently vulnerable.
#[instrument(skip(graph, index, seed, events, cancellation))]
fn propagate_fix(
    graph: &dyn CommitGraph,
    index: &ChildIndex,
    seed: &HashSet<CommitId>,
    events: &EventSets,
    cancellation: &CancellationToken,
) -> Result<HashSet<CommitId>, AnalyzeError> {
    let fixed: Vec<CommitId> = events.fixed.iter().copied().collect();
    let fixed_cone = index.descendants_of(&fixed);

    let order = index.topological_order(graph, seed)?;
    let mut affected: HashMap<CommitId, bool> = HashMap::with_capacity(seed.len());

    for commit in order {
        if cancellation.is_cancelled() {
            return Err(AnalyzeError::Cancelled);
        }

        let parents = graph.parents(commit).map_err(AnalyzeError::from)?;

        let is_affected = if events.fixed.contains(&commit) {
            false
        } else if events.introduced.contains(&commit) {
            true
        } else if parents.iter().any(|parent| fixed_cone.contains(parent)) {
            false
        } else {
            parents
                .iter()
                .any(|parent| seed.contains(parent) && *affected.get(parent).unwrap_or(&false))
        };

        if !is_affected {
            trace!(%commit, "commit excluded by fix propagation");
        }
        affected.insert(commit, is_affected);
    }

    Ok(affected.into_iter().filter(|(_, is_affected)| *is_affected).map(|(commit, _)| commit).collect())
}

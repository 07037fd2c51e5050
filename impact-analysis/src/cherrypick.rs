//! The Cherry-pick Detector: finds commits elsewhere in history whose
//! content equals a known vulnerable commit, with no ancestry relationship
//! to the introduced commit.

use std::collections::{HashMap, HashSet};

use tracing::{instrument, trace};

use crate::cancellation::CancellationToken;
use crate::error::AnalyzeError;
use crate::events::EventSets;
use crate::graph::CommitGraph;
use crate::oid::CommitId;

/// Returns the commits outside `v0` whose fingerprint matches a commit
/// already in `v0`. Merge commits and commits with no fingerprint are
/// skipped, as are commits directly tagged `fixed`, `limit`, or
/// `last_affected` — such a commit has no ancestry relationship to any
/// introduced commit, so the only §4.3 exclusion rules that can meaningfully
/// apply to it are the ones based on its own label, not on dominance along
/// a path from `I`.
#[instrument(skip(graph, all_commits, v0, events, cancellation))]
pub fn detect_cherrypicks(
    graph: &dyn CommitGraph,
    all_commits: &[CommitId],
    v0: &HashSet<CommitId>,
    events: &EventSets,
    cancellation: &CancellationToken,
) -> Result<HashSet<CommitId>, AnalyzeError> {
    let mut fingerprint_in_v0 = HashMap::new();
    for &commit in v0 {
        if let Some(fingerprint) = graph.fingerprint(commit).map_err(AnalyzeError::from)? {
            fingerprint_in_v0.entry(fingerprint).or_insert(commit);
        }
    }

    let mut found = HashSet::new();
    for &commit in all_commits {
        if cancellation.is_cancelled() {
            return Err(AnalyzeError::Cancelled);
        }
        if v0.contains(&commit) {
            continue;
        }
        if events.fixed.contains(&commit) || events.limit.contains(&commit) || events.last_affected.contains(&commit) {
            continue;
        }
        let Some(fingerprint) = graph.fingerprint(commit).map_err(AnalyzeError::from)? else {
            continue;
        };
        if let Some(&origin) = fingerprint_in_v0.get(&fingerprint) {
            trace!(%commit, %origin, "cherry-pick detected");
            found.insert(commit);
        }
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{commit_id, fingerprint, MockGraph};

    #[test]
    fn finds_cherry_pick_with_no_ancestry_relation() {
        let a = commit_id("a");
        let b = commit_id("b");
        let backport_base = commit_id("backport_base");
        let backport = commit_id("backport");

        let mut graph = MockGraph::new();
        graph.add_commit(a, vec![]);
        graph.add_commit(b, vec![a]);
        graph.add_commit(backport_base, vec![]);
        graph.add_commit(backport, vec![backport_base]);
        graph.set_fingerprint(b, fingerprint("the-fix"));
        graph.set_fingerprint(backport, fingerprint("the-fix"));

        let v0 = HashSet::from([b]);
        let known = graph.all_commits().unwrap().into_iter().collect();
        let events = EventSets::classify(&known, &[b], &[], &[], &[]).unwrap();
        let all_commits = graph.all_commits().unwrap();

        let found =
            detect_cherrypicks(&graph, &all_commits, &v0, &events, &CancellationToken::new()).unwrap();
        assert_eq!(found, HashSet::from([backport]));
    }

    #[test]
    fn ignores_commits_with_no_fingerprint() {
        let a = commit_id("a");
        let b = commit_id("b");
        let unrelated = commit_id("unrelated");

        let mut graph = MockGraph::new();
        graph.add_commit(a, vec![]);
        graph.add_commit(b, vec![a]);
        graph.add_commit(unrelated, vec![]);
        graph.set_fingerprint(b, fingerprint("the-fix"));

        let v0 = HashSet::from([b]);
        let known = graph.all_commits().unwrap().into_iter().collect();
        let events = EventSets::classify(&known, &[b], &[], &[], &[]).unwrap();
        let all_commits = graph.all_commits().unwrap();

        let found =
            detect_cherrypicks(&graph, &all_commits, &v0, &events, &CancellationToken::new()).unwrap();
        assert!(found.is_empty());
    }
}

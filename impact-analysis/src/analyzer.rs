//! The analyzer's public surface: [`AnalyzerConfig`] and [`RepoAnalyzer`].

use std::collections::HashSet;

use tracing::instrument;

use crate::cancellation::CancellationToken;
use crate::cherrypick;
use crate::compose::{self, AffectedResult};
use crate::error::AnalyzeError;
use crate::events::EventSets;
use crate::graph::{ChildIndex, CommitGraph};
use crate::oid::CommitId;
use crate::resolver;

/// Per-call tuning for [`RepoAnalyzer`]. Small `Default`-implementing
/// option struct rather than a long constructor argument list, following
/// the `GitInitOptions`/`GitRunOptions` convention this crate's test
/// harness also uses.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Whether to scan the whole graph for commits whose content matches a
    /// known-affected commit but that have no ancestry relationship to it
    /// (see [`crate::cherrypick`]). Off by default: it's an O(V) fingerprint
    /// scan in addition to the O(V+E) resolver pass.
    pub detect_cherrypicks: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            detect_cherrypicks: false,
        }
    }
}

/// Computes the set of commits affected by a vulnerability, given a commit
/// graph and four event-commit sets. Stateless across calls aside from its
/// immutable [`AnalyzerConfig`].
pub struct RepoAnalyzer {
    config: AnalyzerConfig,
}

impl RepoAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    /// Runs a single analysis. Borrows `graph` read-only for the duration
    /// of the call; never mutates the underlying repository.
    #[instrument(skip(self, graph, cancellation), fields(detect_cherrypicks = self.config.detect_cherrypicks))]
    pub fn analyze(
        &self,
        graph: &dyn CommitGraph,
        introduced: &[CommitId],
        fixed: &[CommitId],
        last_affected: &[CommitId],
        limit: &[CommitId],
        cancellation: &CancellationToken,
    ) -> Result<AffectedResult, AnalyzeError> {
        let all_commits = graph.all_commits().map_err(AnalyzeError::from)?;
        let known_commits: HashSet<CommitId> = all_commits.iter().copied().collect();

        let events = EventSets::classify(&known_commits, introduced, fixed, last_affected, limit)?;

        if cancellation.is_cancelled() {
            return Err(AnalyzeError::Cancelled);
        }
        let index = ChildIndex::build(graph).map_err(AnalyzeError::from)?;

        let mut commits = resolver::resolve(graph, &index, &events, cancellation)?;

        if self.config.detect_cherrypicks {
            let cherry_picked =
                cherrypick::detect_cherrypicks(graph, &all_commits, &commits, &events, cancellation)?;
            commits.extend(cherry_picked);
        }

        if cancellation.is_cancelled() {
            return Err(AnalyzeError::Cancelled);
        }
        let ranges = compose::build_ranges(graph, &index, &commits)?;

        Ok(AffectedResult { commits, ranges })
    }
}

//! The Commit Graph View: a read-only adapter over a repository exposing
//! parent relations, reachable sets, and optional content fingerprints.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::instrument;

use crate::error::{AnalyzeError, GraphError};
use crate::git::{BranchType, Repo};
use crate::oid::{CommitId, Fingerprint};

/// A read-only view of a commit DAG. Implemented by [`Git2CommitGraph`] for
/// real repositories and by [`crate::testing::MockGraph`] for unit tests
/// that don't need a real `git2` repository on disk.
pub trait CommitGraph {
    /// Direct parents of `commit`, in parent order.
    fn parents(&self, commit: CommitId) -> Result<Vec<CommitId>, GraphError>;

    /// Every commit reachable from any reference the repository exposes.
    fn all_commits(&self) -> Result<Vec<CommitId>, GraphError>;

    /// A stable content fingerprint for `commit`, used only by the
    /// cherry-pick detector. `Ok(None)` for merge commits and commits with
    /// no parent to diff against; this is not an error condition.
    fn fingerprint(&self, commit: CommitId) -> Result<Option<Fingerprint>, GraphError>;
}

/// A [`CommitGraph`] backed by a real repository via [`git::Repo`](crate::git::Repo).
/// Enumerates `refs/heads/*` and `refs/remotes/**` as the roots of
/// reachability, matching the convention that a vulnerability fix published
/// only on a remote-tracking branch still counts.
pub struct Git2CommitGraph<'repo> {
    repo: &'repo Repo,
}

impl<'repo> Git2CommitGraph<'repo> {
    pub fn new(repo: &'repo Repo) -> Self {
        Self { repo }
    }

    fn tips(&self) -> Result<Vec<CommitId>, GraphError> {
        let mut tips = Vec::new();
        for branch_type in [BranchType::Local, BranchType::Remote] {
            let names = self
                .repo
                .branch_names(branch_type)
                .map_err(|err| GraphError::CorruptGraph(err.to_string()))?;
            for name in names {
                let target = self
                    .repo
                    .branch_target(&name, branch_type)
                    .map_err(|err| GraphError::CorruptGraph(err.to_string()))?;
                if let Some(target) = target {
                    tips.push(target);
                }
            }
        }
        Ok(tips)
    }
}

impl CommitGraph for Git2CommitGraph<'_> {
    #[instrument(skip(self))]
    fn parents(&self, commit: CommitId) -> Result<Vec<CommitId>, GraphError> {
        let commit = self
            .repo
            .find_commit(commit)
            .map_err(|err| GraphError::CorruptGraph(err.to_string()))?
            .ok_or(GraphError::UnknownCommit(commit))?;
        Ok(commit.get_parent_oids())
    }

    #[instrument(skip(self))]
    fn all_commits(&self) -> Result<Vec<CommitId>, GraphError> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::new();
        for tip in self.tips()? {
            if seen.insert(tip) {
                queue.push_back(tip);
            }
        }
        while let Some(commit) = queue.pop_front() {
            for parent in self.parents(commit)? {
                if seen.insert(parent) {
                    queue.push_back(parent);
                }
            }
        }
        Ok(seen.into_iter().collect())
    }

    #[instrument(skip(self))]
    fn fingerprint(&self, commit: CommitId) -> Result<Option<Fingerprint>, GraphError> {
        let commit = self
            .repo
            .find_commit(commit)
            .map_err(|err| GraphError::CorruptGraph(err.to_string()))?
            .ok_or(GraphError::UnknownCommit(commit))?;
        self.repo
            .fingerprint(&commit)
            .map_err(|err| GraphError::CorruptGraph(err.to_string()))
    }
}

/// An inverted child index over a [`CommitGraph`], built once per
/// `analyze()` call. Provides forward traversal (descendants, and
/// reachability that avoids a set of barrier commits) that would otherwise
/// require re-walking `parents()` from every commit.
pub struct ChildIndex {
    children: HashMap<CommitId, Vec<CommitId>>,
    all: HashSet<CommitId>,
}

impl ChildIndex {
    #[instrument(skip(graph))]
    pub fn build(graph: &dyn CommitGraph) -> Result<Self, GraphError> {
        let all_commits = graph.all_commits()?;
        let all: HashSet<CommitId> = all_commits.iter().copied().collect();
        let mut children: HashMap<CommitId, Vec<CommitId>> = HashMap::new();
        for &commit in &all_commits {
            for parent in graph.parents(commit)? {
                if !all.contains(&parent) {
                    return Err(GraphError::CorruptGraph(format!(
                        "commit {commit} has parent {parent} outside the graph"
                    )));
                }
                children.entry(parent).or_default().push(commit);
            }
        }
        Ok(Self { children, all })
    }

    /// The direct children of `commit` known to this index (empty if none).
    pub fn children_of(&self, commit: CommitId) -> &[CommitId] {
        self.children.get(&commit).map_or(&[], Vec::as_slice)
    }

    pub fn contains(&self, commit: CommitId) -> bool {
        self.all.contains(&commit)
    }

    /// All commits that have any of `roots` in their ancestry, inclusive of
    /// the roots themselves. Implemented as BFS over the inverted child
    /// index, per §4.1.
    pub fn descendants_of(&self, roots: &[CommitId]) -> HashSet<CommitId> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::new();
        for &root in roots {
            if seen.insert(root) {
                queue.push_back(root);
            }
        }
        while let Some(commit) = queue.pop_front() {
            for &child in self.children_of(commit) {
                if seen.insert(child) {
                    queue.push_back(child);
                }
            }
        }
        seen
    }

    /// All commits forward-reachable from `roots` without ever stepping
    /// onto a commit in `barrier` (barrier commits are excluded from the
    /// result, and traversal never continues past them). Used to implement
    /// limit locality (§4.3 step 5): a commit stays reachable from an
    /// introduced commit as long as some path to it avoids every limit.
    pub fn reachable_forward_avoiding(
        &self,
        roots: &[CommitId],
        barrier: &HashSet<CommitId>,
    ) -> HashSet<CommitId> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::new();
        for &root in roots {
            if !barrier.contains(&root) && seen.insert(root) {
                queue.push_back(root);
            }
        }
        while let Some(commit) = queue.pop_front() {
            for &child in self.children_of(commit) {
                if !barrier.contains(&child) && seen.insert(child) {
                    queue.push_back(child);
                }
            }
        }
        seen
    }

    /// Orders `commits` so that every parent (restricted to `commits`)
    /// precedes its children. Used by the resolver's fix-propagation pass
    /// and by the result composer's range construction.
    #[instrument(skip(graph, commits))]
    pub fn topological_order(
        &self,
        graph: &dyn CommitGraph,
        commits: &HashSet<CommitId>,
    ) -> Result<Vec<CommitId>, AnalyzeError> {
        let mut indegree: HashMap<CommitId, usize> = HashMap::with_capacity(commits.len());
        for &commit in commits {
            let parent_count = graph
                .parents(commit)
                .map_err(AnalyzeError::from)?
                .into_iter()
                .filter(|parent| commits.contains(parent))
                .count();
            indegree.insert(commit, parent_count);
        }

        // A `BTreeSet` rather than a `VecDeque` for the ready set: `HashMap`
        // iteration order depends on a per-instance random seed, which would
        // make the resulting order (and anything derived from it, like
        // commit ranges) vary between two calls with identical inputs.
        let mut ready: std::collections::BTreeSet<CommitId> = indegree
            .iter()
            .filter(|(_, &degree)| degree == 0)
            .map(|(&commit, _)| commit)
            .collect();
        let mut order = Vec::with_capacity(commits.len());
        while let Some(&commit) = ready.iter().next() {
            ready.remove(&commit);
            order.push(commit);
            for &child in self.children_of(commit) {
                if let Some(degree) = commits.contains(&child).then(|| indegree.get_mut(&child)).flatten() {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.insert(child);
                    }
                }
            }
        }

        if order.len() != commits.len() {
            return Err(AnalyzeError::CorruptGraph(
                "cycle detected while ordering commits".to_owned(),
            ));
        }
        Ok(order)
    }
}

//! A minimal in-memory [`CommitGraph`] for unit tests that don't need a
//! real on-disk repository. This is inside `src` rather than `tests` since
//! we use it in unit tests colocated with the algorithmic modules
//! themselves; integration tests that exercise a real `git2` repository use
//! the `impact-testing` crate instead.

use std::collections::HashMap;

use crate::error::GraphError;
use crate::graph::CommitGraph;
use crate::oid::{CommitId, Fingerprint};

/// A commit graph built directly from a parent map. Commit identifiers are
/// whatever the caller chooses; [`commit_id`] derives a stable one from a
/// short label, so tests can write `commit_id("b")` instead of threading
/// real `git2::Oid` values around.
#[derive(Debug, Default)]
pub struct MockGraph {
    parents: HashMap<CommitId, Vec<CommitId>>,
    fingerprints: HashMap<CommitId, Fingerprint>,
}

impl MockGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a commit with the given parents (empty for a root).
    pub fn add_commit(&mut self, commit: CommitId, parents: Vec<CommitId>) -> &mut Self {
        self.parents.insert(commit, parents);
        self
    }

    /// Assigns a fingerprint to a commit, for cherry-pick detection tests.
    pub fn set_fingerprint(&mut self, commit: CommitId, fingerprint: Fingerprint) -> &mut Self {
        self.fingerprints.insert(commit, fingerprint);
        self
    }
}

impl CommitGraph for MockGraph {
    fn parents(&self, commit: CommitId) -> Result<Vec<CommitId>, GraphError> {
        self.parents
            .get(&commit)
            .cloned()
            .ok_or(GraphError::UnknownCommit(commit))
    }

    fn all_commits(&self) -> Result<Vec<CommitId>, GraphError> {
        Ok(self.parents.keys().copied().collect())
    }

    fn fingerprint(&self, commit: CommitId) -> Result<Option<Fingerprint>, GraphError> {
        if !self.parents.contains_key(&commit) {
            return Err(GraphError::UnknownCommit(commit));
        }
        Ok(self.fingerprints.get(&commit).copied())
    }
}

/// Derives a deterministic [`CommitId`] from a short label, for tests where
/// the actual hash value is irrelevant, only that the same label always
/// produces the same ID.
pub fn commit_id(label: &str) -> CommitId {
    let oid = git2::Oid::hash_object(git2::ObjectType::Blob, label.as_bytes())
        .expect("hashing a short label never fails");
    CommitId::from_oid(oid)
}

/// Derives a deterministic [`Fingerprint`] from a short label, for cherry-pick
/// detection tests.
pub fn fingerprint(label: &str) -> Fingerprint {
    let oid = git2::Oid::hash_object(git2::ObjectType::Blob, label.as_bytes())
        .expect("hashing a short label never fails");
    Fingerprint(oid)
}

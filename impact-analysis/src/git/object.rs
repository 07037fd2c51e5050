//! Wrapper around a single Git commit object.

use tracing::instrument;

use crate::oid::CommitId;

/// Represents a commit object in the Git object database.
#[derive(Clone)]
pub struct Commit<'repo> {
    pub(super) inner: git2::Commit<'repo>,
}

impl std::fmt::Debug for Commit<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<Commit {}>", self.get_oid())
    }
}

impl<'repo> Commit<'repo> {
    /// Get the object ID of the commit.
    pub fn get_oid(&self) -> CommitId {
        CommitId::from_oid(self.inner.id())
    }

    /// Get the object IDs of the parents of this commit, in parent order.
    #[instrument]
    pub fn get_parent_oids(&self) -> Vec<CommitId> {
        self.inner.parent_ids().map(CommitId::from_oid).collect()
    }

    /// Get the number of parents of this commit. Zero for a root commit, one
    /// for an ordinary commit, two or more for a merge commit.
    pub fn get_parent_count(&self) -> usize {
        self.inner.parent_count()
    }

    /// Get the OID of this commit's tree.
    pub fn get_tree_oid(&self) -> git2::Oid {
        self.inner.tree_id()
    }

    /// Get the first line of the commit message, for diagnostics.
    pub fn get_summary(&self) -> String {
        self.inner.summary().unwrap_or("<non-utf8 message>").to_owned()
    }
}

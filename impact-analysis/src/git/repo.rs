//! Operations on the Git repository. This module exists for a few reasons:
//!
//! - To ensure that every call to a Git operation has an associated error
//!   variant, rather than letting `git2::Error` leak out unannotated.
//! - To collect the handful of `git2` operations the analyzer and the test
//!   harness actually need, rather than re-exporting all of `git2`.
//! - To make it possible to audit every Git operation carried out by this
//!   crate in one place.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::instrument;

use crate::oid::{CommitId, Fingerprint};

use super::Commit;

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum Error {
    #[error("could not open repository: {0}")]
    OpenRepo(#[source] git2::Error),

    #[error("could not initialize repository: {0}")]
    InitRepo(#[source] git2::Error),

    #[error("could not find commit {oid}: {source}")]
    FindCommit { source: git2::Error, oid: CommitId },

    #[error("could not find tree {oid}: {source}")]
    FindTree { source: git2::Error, oid: git2::Oid },

    #[error("could not create blob: {0}")]
    CreateBlob(#[source] git2::Error),

    #[error("could not build tree: {0}")]
    BuildTree(#[source] git2::Error),

    #[error("could not create commit: {0}")]
    CreateCommit(#[source] git2::Error),

    #[error("could not create signature: {0}")]
    CreateSignature(#[source] git2::Error),

    #[error("could not create or update branch '{name}': {source}")]
    CreateBranch { source: git2::Error, name: String },

    #[error("could not create or update reference '{name}': {source}")]
    CreateReference { source: git2::Error, name: String },

    #[error("could not read branches: {0}")]
    GetBranches(#[source] git2::Error),

    #[error("could not read branch name: {0}")]
    ReadBranchName(#[source] git2::Error),

    #[error("could not diff trees: {0}")]
    DiffTreeToTree(#[source] git2::Error),

    #[error("could not compute patch id: {0}")]
    GetPatchId(#[source] git2::Error),
}

/// Result type for this module.
pub type Result<T> = std::result::Result<T, Error>;

/// Re-export of [`git2::BranchType`], so callers don't need a direct `git2`
/// dependency just to say "local" or "remote".
pub type BranchType = git2::BranchType;

/// A thin wrapper around a `git2::Repository`. Unlike the analyzer's
/// [`crate::graph::CommitGraph`] trait, this type also exposes the handful of
/// write operations the test harness needs to build fixture repositories; the
/// analyzer itself only ever calls the read-only methods.
pub struct Repo {
    inner: git2::Repository,
}

impl std::fmt::Debug for Repo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<Repo at {:?}>", self.inner.path())
    }
}

impl Repo {
    /// Open an existing repository (bare or not) at the given path.
    #[instrument]
    pub fn open(path: &Path) -> Result<Self> {
        let inner = git2::Repository::open(path).map_err(Error::OpenRepo)?;
        Ok(Self { inner })
    }

    /// Initialize a fresh bare repository at the given path. Test fixtures
    /// use a bare repository since the analyzer only ever inspects the
    /// object database and refs, never a working copy.
    #[instrument]
    pub fn init_bare(path: &Path) -> Result<Self> {
        let inner = git2::Repository::init_bare(path).map_err(Error::InitRepo)?;
        Ok(Self { inner })
    }

    /// Look up a commit by OID. Returns `None` if it does not exist.
    #[instrument]
    pub fn find_commit(&self, oid: CommitId) -> Result<Option<Commit<'_>>> {
        match self.inner.find_commit(oid.as_oid()) {
            Ok(commit) => Ok(Some(Commit { inner: commit })),
            Err(err) if err.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(err) => Err(Error::FindCommit { source: err, oid }),
        }
    }

    /// Write a blob containing the given bytes and return its OID.
    #[instrument(skip(content))]
    pub fn write_blob(&self, content: &[u8]) -> Result<git2::Oid> {
        self.inner.blob(content).map_err(Error::CreateBlob)
    }

    /// Build a new tree on top of `base_tree` (or an empty tree, if `None`)
    /// with a single additional blob entry at `filename`.
    #[instrument]
    pub fn insert_blob_into_tree(
        &self,
        base_tree: Option<git2::Oid>,
        filename: &str,
        blob_oid: git2::Oid,
    ) -> Result<git2::Oid> {
        let base_tree = match base_tree {
            Some(oid) => Some(
                self.inner
                    .find_tree(oid)
                    .map_err(|source| Error::FindTree { source, oid })?,
            ),
            None => None,
        };
        let mut builder = self
            .inner
            .treebuilder(base_tree.as_ref())
            .map_err(Error::BuildTree)?;
        builder
            .insert(filename, blob_oid, i32::from(git2::FileMode::Blob))
            .map_err(Error::BuildTree)?;
        builder.write().map_err(Error::BuildTree)
    }

    /// Create a new commit with the given tree and parents, authored and
    /// committed by a fixed, deterministic identity (test fixtures don't care
    /// who "wrote" the commit).
    #[instrument]
    pub fn create_commit(
        &self,
        message: &str,
        tree_oid: git2::Oid,
        parents: &[CommitId],
    ) -> Result<CommitId> {
        let signature =
            git2::Signature::new("Test User", "test@example.com", &git2::Time::new(0, 0))
                .map_err(Error::CreateSignature)?;
        let tree = self
            .inner
            .find_tree(tree_oid)
            .map_err(|source| Error::FindTree { source, oid: tree_oid })?;
        let parent_commits = parents
            .iter()
            .map(|oid| {
                self.inner
                    .find_commit(oid.as_oid())
                    .map_err(|source| Error::FindCommit { source, oid: *oid })
            })
            .collect::<Result<Vec<_>>>()?;
        let parent_refs = parent_commits.iter().collect::<Vec<_>>();
        let oid = self
            .inner
            .commit(None, &signature, &signature, message, &tree, &parent_refs)
            .map_err(Error::CreateCommit)?;
        Ok(CommitId::from_oid(oid))
    }

    /// Create or force-update a local branch to point at `target`.
    #[instrument]
    pub fn create_branch(&self, name: &str, target: CommitId) -> Result<()> {
        let commit = self
            .inner
            .find_commit(target.as_oid())
            .map_err(|source| Error::FindCommit { source, oid: target })?;
        self.inner
            .branch(name, &commit, true)
            .map_err(|source| Error::CreateBranch {
                source,
                name: name.to_owned(),
            })?;
        Ok(())
    }

    /// Create or force-update an arbitrary reference (used to publish remote
    /// tracking refs under `refs/remotes/origin/*`).
    #[instrument]
    pub fn create_reference(&self, name: &str, target: CommitId) -> Result<()> {
        self.inner
            .reference(name, target.as_oid(), true, "impact-testing")
            .map_err(|source| Error::CreateReference {
                source,
                name: name.to_owned(),
            })?;
        Ok(())
    }

    /// List the names of all branches of the given type (local or remote).
    #[instrument]
    pub fn branch_names(&self, branch_type: BranchType) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for branch in self.inner.branches(Some(branch_type)).map_err(Error::GetBranches)? {
            let (branch, _branch_type) = branch.map_err(Error::GetBranches)?;
            let name = branch
                .name()
                .map_err(Error::ReadBranchName)?
                .map(str::to_owned);
            if let Some(name) = name {
                names.push(name);
            }
        }
        Ok(names)
    }

    /// Resolve a local or remote branch name to the commit it points at.
    #[instrument]
    pub fn branch_target(&self, name: &str, branch_type: BranchType) -> Result<Option<CommitId>> {
        match self.inner.find_branch(name, branch_type) {
            Ok(branch) => Ok(branch.get().target().map(CommitId::from_oid)),
            Err(err) if err.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(err) => Err(Error::GetBranches(err)),
        }
    }

    /// Compute the content fingerprint of a single-parent commit: a diff
    /// patch ID between the parent's tree and the commit's tree, stable
    /// across rebases and cherry-picks. Returns `None` for root commits and
    /// merge commits (see [`crate::graph::CommitGraph::fingerprint`]).
    #[instrument]
    pub fn fingerprint(&self, commit: &Commit<'_>) -> Result<Option<Fingerprint>> {
        let parent_tree_oid = match commit.get_parent_count() {
            0 => return Ok(None),
            1 => {
                let parent_oid = commit.get_parent_oids()[0];
                let parent = self
                    .inner
                    .find_commit(parent_oid.as_oid())
                    .map_err(|source| Error::FindCommit { source, oid: parent_oid })?;
                parent.tree_id()
            }
            _ => return Ok(None),
        };
        let parent_tree = self
            .inner
            .find_tree(parent_tree_oid)
            .map_err(|source| Error::FindTree { source, oid: parent_tree_oid })?;
        let current_tree = self
            .inner
            .find_tree(commit.get_tree_oid())
            .map_err(|source| Error::FindTree {
                source,
                oid: commit.get_tree_oid(),
            })?;
        let diff = self
            .inner
            .diff_tree_to_tree(Some(&parent_tree), Some(&current_tree), None)
            .map_err(Error::DiffTreeToTree)?;
        let patch_id = diff.patchid(None).map_err(Error::GetPatchId)?;
        Ok(Some(Fingerprint(patch_id)))
    }

    /// Path to the repository (the `.git` directory, or the repository root
    /// itself if bare).
    pub fn path(&self) -> PathBuf {
        self.inner.path().to_owned()
    }
}

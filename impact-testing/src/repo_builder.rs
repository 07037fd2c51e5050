//! Builds disposable `git2` repositories with labeled commits, for testing
//! `impact-analysis` against a real repository rather than a mocked graph.

use std::collections::{HashMap, HashSet};

use eyre::{eyre, Context};
use impact::git::Repo;
use impact::{CommitId, Git2CommitGraph};
use tempfile::TempDir;
use tracing::instrument;

/// The event label a harness-built commit carries, mirroring
/// `impact::EventKind` but with an extra `None` variant for commits that
/// aren't part of the scenario under test.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    None,
    Introduced,
    Fixed,
    LastAffected,
    Limit,
}

const DEFAULT_BRANCH: &str = "master";

/// A disposable `git2` repository with a single initial commit (`A`),
/// built incrementally via [`TestRepository::add_commit`] and
/// [`TestRepository::merge`]. The repository and its backing directory are
/// dropped together.
pub struct TestRepository {
    // Kept alive for the lifetime of the repository; never read directly.
    _temp_dir: TempDir,
    repo: Repo,
    current_branch: String,
    commit_ids: HashMap<String, CommitId>,
    introduced: Vec<CommitId>,
    fixed: Vec<CommitId>,
    last_affected: Vec<CommitId>,
    limit: Vec<CommitId>,
    content_counter: u64,
    // The (filename, blob) each commit added relative to its first parent,
    // so `cherry_pick` can reproduce the same tree change against an
    // unrelated parent and get a matching patch ID.
    commit_changes: HashMap<CommitId, (String, git2::Oid)>,
}

impl TestRepository {
    /// Creates a fresh bare repository with a single root commit labeled
    /// `A` (no event) on `master`.
    #[instrument]
    pub fn new() -> eyre::Result<Self> {
        let temp_dir = tempfile::tempdir().context("creating temporary directory")?;
        let repo = Repo::init_bare(temp_dir.path()).context("initializing bare repository")?;

        let mut this = Self {
            _temp_dir: temp_dir,
            repo,
            current_branch: DEFAULT_BRANCH.to_owned(),
            commit_ids: HashMap::new(),
            introduced: Vec::new(),
            fixed: Vec::new(),
            last_affected: Vec::new(),
            limit: Vec::new(),
            content_counter: 0,
            commit_changes: HashMap::new(),
        };

        let root = this.write_commit("A", None, &[])?;
        this.repo
            .create_branch(DEFAULT_BRANCH, root)
            .context("creating default branch")?;
        Ok(this)
    }

    /// Adds a commit labeled `message` on top of `parents` (the repo's
    /// current branch advances to it). Each commit's tree differs uniquely
    /// from every other commit's, even given identical messages/parents.
    #[instrument(skip(self))]
    pub fn add_commit(
        &mut self,
        message: &str,
        parents: &[CommitId],
        event: Event,
    ) -> eyre::Result<CommitId> {
        let base_tree = match parents.first() {
            Some(&parent) => Some(self.tree_of(parent)?),
            None => None,
        };
        let commit = self.write_commit(message, base_tree, parents)?;
        self.repo
            .create_branch(&self.current_branch, commit)
            .context("advancing branch")?;
        self.record_event(commit, event);
        Ok(commit)
    }

    /// Creates a new local branch at the current branch's head. Does not
    /// switch to it; see [`TestRepository::checkout`].
    #[instrument(skip(self))]
    pub fn create_branch(&mut self, name: &str) -> eyre::Result<()> {
        let head = self.current_head()?;
        self.repo.create_branch(name, head).context("creating branch")?;
        Ok(())
    }

    /// Switches subsequent `add_commit`/`merge` calls to build on `name`.
    pub fn checkout(&mut self, name: &str) {
        self.current_branch = name.to_owned();
    }

    /// Creates a merge commit joining the current branch's head with
    /// `other`, advancing the current branch to it.
    #[instrument(skip(self))]
    pub fn merge(&mut self, message: &str, other: CommitId, event: Event) -> eyre::Result<CommitId> {
        let head = self.current_head()?;
        let base_tree = self.tree_of(head)?;
        let commit = self.write_commit(message, Some(base_tree), &[head, other])?;
        self.repo
            .create_branch(&self.current_branch, commit)
            .context("advancing branch")?;
        self.record_event(commit, event);
        Ok(commit)
    }

    /// Publishes every local branch as a remote-tracking ref under
    /// `refs/remotes/origin/*`. The analyzer considers both local and
    /// remote refs when enumerating reachable commits, so scenarios that
    /// rely on a commit only being reachable via a remote ref need this.
    #[instrument(skip(self))]
    pub fn create_remote_branch(&mut self) -> eyre::Result<()> {
        let names = self
            .repo
            .branch_names(impact::git::BranchType::Local)
            .context("enumerating local branches")?;
        for name in names {
            let target = self
                .repo
                .branch_target(&name, impact::git::BranchType::Local)
                .context("resolving branch")?
                .ok_or_else(|| eyre!("branch {name} has no target"))?;
            self.repo
                .create_reference(&format!("refs/remotes/origin/{name}"), target)
                .context("creating remote-tracking ref")?;
        }
        Ok(())
    }

    /// The commit IDs of every labeled commit, in `(introduced, fixed,
    /// last_affected, limit)` order.
    pub fn ranges(&self) -> (Vec<CommitId>, Vec<CommitId>, Vec<CommitId>, Vec<CommitId>) {
        (
            self.introduced.clone(),
            self.fixed.clone(),
            self.last_affected.clone(),
            self.limit.clone(),
        )
    }

    /// Maps commit messages back to the IDs [`TestRepository::add_commit`]
    /// and [`TestRepository::merge`] assigned them, for use in assertions.
    pub fn commit_ids(&self, messages: &[&str]) -> eyre::Result<HashSet<CommitId>> {
        messages
            .iter()
            .map(|message| {
                self.commit_ids
                    .get(*message)
                    .copied()
                    .ok_or_else(|| eyre!("no commit labeled {message:?}"))
            })
            .collect()
    }

    /// Creates a commit on top of `parent` that reproduces the exact
    /// tree change `source` introduced relative to its own parent: same
    /// file, same content, different ancestry. This is what it means to
    /// cherry-pick a commit onto an unrelated branch, and is the only way
    /// to get two commits with a matching fingerprint out of this harness,
    /// since every other commit gets its own uniquely-named file.
    #[instrument(skip(self))]
    pub fn cherry_pick(
        &mut self,
        message: &str,
        parent: CommitId,
        source: CommitId,
    ) -> eyre::Result<CommitId> {
        let (filename, blob) = self
            .commit_changes
            .get(&source)
            .ok_or_else(|| eyre!("source commit {source} has no recorded change"))?
            .clone();
        let base_tree = self.tree_of(parent)?;
        let tree = self
            .repo
            .insert_blob_into_tree(Some(base_tree), &filename, blob)
            .context("building tree")?;
        let commit = self
            .repo
            .create_commit(message, tree, &[parent])
            .context("creating commit")?;
        self.commit_ids.insert(message.to_owned(), commit);
        self.commit_changes.insert(commit, (filename, blob));
        Ok(commit)
    }

    /// A [`Git2CommitGraph`] view over this repository, for passing to
    /// `RepoAnalyzer::analyze`.
    pub fn graph(&self) -> Git2CommitGraph<'_> {
        Git2CommitGraph::new(&self.repo)
    }

    fn current_head(&self) -> eyre::Result<CommitId> {
        self.repo
            .branch_target(&self.current_branch, impact::git::BranchType::Local)
            .context("resolving current branch")?
            .ok_or_else(|| eyre!("current branch {} has no target", self.current_branch))
    }

    fn tree_of(&self, commit: CommitId) -> eyre::Result<git2::Oid> {
        Ok(self
            .repo
            .find_commit(commit)
            .context("looking up commit")?
            .ok_or_else(|| eyre!("commit {commit} vanished"))?
            .get_tree_oid())
    }

    fn record_event(&mut self, commit: CommitId, event: Event) {
        match event {
            Event::None => {}
            Event::Introduced => self.introduced.push(commit),
            Event::Fixed => self.fixed.push(commit),
            Event::LastAffected => self.last_affected.push(commit),
            Event::Limit => self.limit.push(commit),
        }
    }

    fn write_commit(
        &mut self,
        message: &str,
        base_tree: Option<git2::Oid>,
        parents: &[CommitId],
    ) -> eyre::Result<CommitId> {
        let filename = format!("file-{}", self.content_counter);
        self.content_counter += 1;
        let blob = self.repo.write_blob(message.as_bytes()).context("writing blob")?;
        let tree = self
            .repo
            .insert_blob_into_tree(base_tree, &filename, blob)
            .context("building tree")?;
        let commit = self
            .repo
            .create_commit(message, tree, parents)
            .context("creating commit")?;
        self.commit_ids.insert(message.to_owned(), commit);
        self.commit_changes.insert(commit, (filename, blob));
        Ok(commit)
    }
}

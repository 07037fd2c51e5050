//! Error types at the analyzer's public surface and at the graph-view
//! boundary. Lower layers (`git::Repo`) have their own `thiserror` error
//! enum for `git2`-level failures; those are folded into [`GraphError`] at
//! the point where the graph view calls into `git::Repo`, and from there
//! into [`AnalyzeError`] at the analyzer's surface.

use thiserror::Error;

use crate::oid::CommitId;

/// Failures reading the commit graph itself (as opposed to failures in the
/// event commits the caller supplied — see [`AnalyzeError`]).
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("commit {0} is not present in the graph")]
    UnknownCommit(CommitId),

    #[error("commit graph is corrupt: {0}")]
    CorruptGraph(String),
}

/// Failures surfaced by [`crate::RepoAnalyzer::analyze`].
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("commit {0} is not present in the repository")]
    UnknownCommit(CommitId),

    #[error("commit {0} is tagged with more than one event")]
    ConflictingEvent(CommitId),

    #[error("commit graph is corrupt: {0}")]
    CorruptGraph(String),

    #[error("analysis was cancelled")]
    Cancelled,
}

impl From<GraphError> for AnalyzeError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::UnknownCommit(oid) => AnalyzeError::UnknownCommit(oid),
            GraphError::CorruptGraph(message) => AnalyzeError::CorruptGraph(message),
        }
    }
}

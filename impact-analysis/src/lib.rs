//! Computes the set of commits affected by a security vulnerability, given
//! a commit graph and a handful of event commits: where the vulnerability
//! was introduced, where it was fixed, the last commit known to carry it,
//! and an optional bound past which the analysis should not continue.
//!
//! The entry point is [`RepoAnalyzer::analyze`]. Repositories are exposed to
//! the analyzer through the [`CommitGraph`] trait, so that both a real
//! `git2`-backed repository ([`Git2CommitGraph`]) and lightweight in-memory
//! fixtures ([`testing::MockGraph`]) can be analyzed the same way.

mod analyzer;
mod cancellation;
mod cherrypick;
mod compose;
mod error;
mod events;
pub mod git;
mod graph;
mod oid;
mod resolver;
pub mod testing;

pub use analyzer::{AnalyzerConfig, RepoAnalyzer};
pub use cancellation::CancellationToken;
pub use compose::{AffectedResult, CommitRange};
pub use error::{AnalyzeError, GraphError};
pub use events::EventKind;
pub use graph::{CommitGraph, Git2CommitGraph};
pub use oid::{CommitId, Fingerprint};

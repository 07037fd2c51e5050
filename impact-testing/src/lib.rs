//! Builds disposable `git2` repositories with labeled commits, so that
//! `impact-analysis`'s test suite can exercise real repositories rather
//! than mocked graphs. The repository and its backing directory are
//! dropped together with [`TestRepository`].

mod repo_builder;

pub use repo_builder::{Event, TestRepository};

//! Thin wrapper around `git2`, in the style of `git-branchless-lib`'s `git`
//! module: every fallible `git2` call is given its own `Error` variant and
//! `wrap_err`-equivalent, so that a caller can tell a corrupt repository from
//! a missing commit from an I/O error.

mod object;
mod repo;

pub use object::Commit;
pub use repo::{BranchType, Error, Repo, Result};

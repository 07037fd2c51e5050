//! The commit identifier type used throughout this crate.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// An opaque commit identifier, backed by a `git2::Oid`.
///
/// This is a thin wrapper rather than a bare `git2::Oid` so that the rest of
/// the crate never has to import `git2` just to talk about "a commit", and so
/// that a future backend could swap in a different hash scheme without
/// touching the public API.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CommitId(pub(crate) git2::Oid);

impl CommitId {
    /// Wrap a raw `git2::Oid`.
    pub fn from_oid(oid: git2::Oid) -> Self {
        Self(oid)
    }

    /// View the underlying `git2::Oid`.
    pub fn as_oid(&self) -> git2::Oid {
        self.0
    }
}

impl fmt::Debug for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CommitId({})", self.0)
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CommitId {
    type Err = git2::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(git2::Oid::from_str(s)?))
    }
}

impl Serialize for CommitId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for CommitId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse()
            .map_err(|_| de::Error::invalid_value(de::Unexpected::Str(&s), &"a valid commit id"))
    }
}

/// A stable content fingerprint for a single-parent commit's change, used only
/// by the cherry-pick detector (see [`crate::cherrypick`]). Backed by `git2`'s
/// patch ID, which is designed to be stable across rebases and cherry-picks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Fingerprint(pub(crate) git2::Oid);

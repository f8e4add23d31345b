use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::object_id::ObjectId;

/// Mapping from working-tree path to the [`ObjectId`] of its blob.
pub type Snapshot = BTreeMap<String, ObjectId>;

/// An immutable commit record. Its identity is the [`ObjectId`] of its
/// serialized form, so every field, the timestamp included, contributes
/// to it.
#[derive(PartialEq, Eq, Debug, Clone, Serialize, Deserialize)]
pub struct Commit {
    /// The message added with the commit.
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// The first parent, followed by the merged-in parent for merge
    /// commits. Empty only for the root commit.
    pub parents: Vec<ObjectId>,
    pub snapshot: Snapshot,
}

impl Commit {
    /// The commit every repository starts from.
    pub fn root() -> Self {
        Commit {
            message: String::from("initial commit"),
            timestamp: DateTime::<Utc>::UNIX_EPOCH,
            parents: Vec::new(),
            snapshot: Snapshot::new(),
        }
    }

    pub fn new(
        message: String,
        timestamp: DateTime<Utc>,
        parents: Vec<ObjectId>,
        snapshot: Snapshot,
    ) -> Self {
        debug_assert!(parents.len() <= 2, "at most two parents");
        Commit {
            message,
            timestamp,
            parents,
            snapshot,
        }
    }

    pub fn first_parent(&self) -> Option<ObjectId> {
        self.parents.first().copied()
    }

    pub fn merge_parent(&self) -> Option<ObjectId> {
        self.parents.get(1).copied()
    }

    pub fn is_merge(&self) -> bool {
        self.parents.len() == 2
    }

    /// The blob tracked for `path`, if any.
    pub fn blob(&self, path: &str) -> Option<ObjectId> {
        self.snapshot.get(path).copied()
    }

    pub fn tracks(&self, path: &str) -> bool {
        self.snapshot.contains_key(path)
    }

    /// The serialized form whose digest is this commit's identity.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }

    pub fn id(&self) -> Result<ObjectId, serde_json::Error> {
        Ok((&self.to_bytes()?).into())
    }
}

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{commit::Snapshot, object_id::ObjectId};

/// Changes waiting for the next commit: contents to record per path and
/// paths to drop. A path is never in both at once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingIndex {
    additions: BTreeMap<String, ObjectId>,
    removals: BTreeSet<String>,
}

impl StagingIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_clean(&self) -> bool {
        self.additions.is_empty() && self.removals.is_empty()
    }

    pub fn additions(&self) -> &BTreeMap<String, ObjectId> {
        &self.additions
    }

    pub fn removals(&self) -> &BTreeSet<String> {
        &self.removals
    }

    pub fn staged(&self, path: &str) -> Option<ObjectId> {
        self.additions.get(path).copied()
    }

    pub fn is_removed(&self, path: &str) -> bool {
        self.removals.contains(path)
    }

    /// Stages `blob` as the next content of `path`. Content identical to
    /// `tracked`, the head's version, is not a change: any earlier staged
    /// addition is dropped instead. Returns whether an addition is now
    /// staged.
    pub fn stage_add(&mut self, path: &str, blob: ObjectId, tracked: Option<ObjectId>) -> bool {
        self.removals.remove(path);
        if tracked == Some(blob) {
            log::debug!("{} matches the head; not staging", path);
            self.additions.remove(path);
            false
        } else {
            log::debug!("staging {} as {}", path, blob);
            self.additions.insert(path.to_string(), blob);
            true
        }
    }

    /// Drops a staged addition of `path` and, when the head tracks it,
    /// marks it for removal. Returns `false` when there was nothing to
    /// remove.
    pub fn stage_remove(&mut self, path: &str, tracked: bool) -> bool {
        let unstaged = self.additions.remove(path).is_some();
        if tracked {
            log::debug!("staging removal of {}", path);
            self.removals.insert(path.to_string());
        }
        unstaged || tracked
    }

    pub fn clear(&mut self) {
        self.additions.clear();
        self.removals.clear();
    }

    /// `snapshot` with the staged removals and additions applied.
    pub fn apply(&self, snapshot: &Snapshot) -> Snapshot {
        let mut next: Snapshot = snapshot
            .iter()
            .filter(|(path, _)| !self.removals.contains(*path))
            .map(|(path, id)| (path.clone(), *id))
            .collect();
        next.extend(self.additions.iter().map(|(path, id)| (path.clone(), *id)));
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob(s: &str) -> ObjectId {
        s.as_bytes().into()
    }

    #[test]
    fn test_add_unchanged_content_is_noop() {
        let mut index = StagingIndex::new();
        assert!(!index.stage_add("f.txt", blob("same"), Some(blob("same"))));
        assert!(index.is_clean());
    }

    #[test]
    fn test_add_reverting_to_head_unstages() {
        let mut index = StagingIndex::new();
        assert!(index.stage_add("f.txt", blob("new"), Some(blob("old"))));
        assert!(!index.stage_add("f.txt", blob("old"), Some(blob("old"))));
        assert!(index.is_clean());
    }

    #[test]
    fn test_add_clears_pending_removal() {
        let mut index = StagingIndex::new();
        assert!(index.stage_remove("f.txt", true));
        assert!(index.is_removed("f.txt"));
        index.stage_add("f.txt", blob("old"), Some(blob("old")));
        assert!(!index.is_removed("f.txt"));
        assert!(index.is_clean());
    }

    #[test]
    fn test_remove_untracked_staged_file_only_unstages() {
        let mut index = StagingIndex::new();
        index.stage_add("g.txt", blob("g"), None);
        assert!(index.stage_remove("g.txt", false));
        assert!(index.is_clean());
        assert!(!index.stage_remove("g.txt", false));
    }

    #[test]
    fn test_remove_staged_and_tracked_file() {
        let mut index = StagingIndex::new();
        index.stage_add("f.txt", blob("new"), Some(blob("old")));
        assert!(index.stage_remove("f.txt", true));
        assert_eq!(index.staged("f.txt"), None);
        assert!(index.is_removed("f.txt"));
    }

    #[test]
    fn test_apply_and_clear() {
        let head: Snapshot = [
            (String::from("f.txt"), blob("f")),
            (String::from("g.txt"), blob("g")),
        ]
        .into_iter()
        .collect();
        let mut index = StagingIndex::new();
        index.stage_remove("g.txt", true);
        index.stage_add("f.txt", blob("f2"), Some(blob("f")));
        index.stage_add("h.txt", blob("h"), None);
        let next = index.apply(&head);
        let expected: Snapshot = [
            (String::from("f.txt"), blob("f2")),
            (String::from("h.txt"), blob("h")),
        ]
        .into_iter()
        .collect();
        assert_eq!(next, expected);
        index.clear();
        assert!(index.is_clean());
    }
}

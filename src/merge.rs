//! Three-way merge classification.
//!
//! Every path in the merge base, the current commit, or the other commit
//! is compared by blob id, with "absent" counted as a state of its own.
//! The planner only decides; applying the plan to the working tree and
//! staging index is the repository's job.

use std::collections::{BTreeMap, BTreeSet};

use crate::{commit::Snapshot, object_id::ObjectId};

/// What happens to one path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathAction {
    /// The current version stands.
    Keep,
    /// Take the other side's content.
    Adopt(ObjectId),
    /// The other side deleted a path the current side left alone.
    Remove,
    /// Both sides changed the path, differently.
    Conflict {
        current: Option<ObjectId>,
        other: Option<ObjectId>,
    },
}

pub fn classify(
    base: Option<ObjectId>,
    current: Option<ObjectId>,
    other: Option<ObjectId>,
) -> PathAction {
    if other == base || other == current {
        PathAction::Keep
    } else if current == base {
        match other {
            Some(id) => PathAction::Adopt(id),
            None => PathAction::Remove,
        }
    } else {
        PathAction::Conflict { current, other }
    }
}

/// The non-trivial actions of a merge, keyed by path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergePlan {
    actions: BTreeMap<String, PathAction>,
}

impl MergePlan {
    pub fn new(base: &Snapshot, current: &Snapshot, other: &Snapshot) -> Self {
        let paths: BTreeSet<&String> = base.keys().chain(current.keys()).chain(other.keys()).collect();
        let actions = paths
            .into_iter()
            .filter_map(|path| {
                let action = classify(
                    base.get(path).copied(),
                    current.get(path).copied(),
                    other.get(path).copied(),
                );
                log::debug!("merge: {} -> {:?}", path, action);
                (action != PathAction::Keep).then(|| (path.clone(), action))
            })
            .collect();
        MergePlan { actions }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, PathAction)> + '_ {
        self.actions.iter().map(|(path, action)| (path.as_str(), *action))
    }

    pub fn conflicts(&self) -> Vec<String> {
        self.actions
            .iter()
            .filter(|(_, action)| matches!(action, PathAction::Conflict { .. }))
            .map(|(path, _)| path.clone())
            .collect()
    }
}

/// The working-tree content recorded for a conflicted path. An absent side
/// contributes nothing.
pub fn conflict_marker(current: &[u8], other: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(current.len() + other.len() + 32);
    out.extend_from_slice(b"<<<<<<< HEAD\n");
    out.extend_from_slice(current);
    out.extend_from_slice(b"=======\n");
    out.extend_from_slice(other);
    out.extend_from_slice(b">>>>>>>\n");
    out
}

/// How a merge concluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The current branch was an ancestor; its head moved to the other
    /// branch's head and no commit was made.
    FastForwarded(ObjectId),
    /// A two-parent commit was made. Conflicted paths carry markers.
    Merged {
        commit: ObjectId,
        conflicts: Vec<String>,
    },
}

impl MergeOutcome {
    pub fn has_conflicts(&self) -> bool {
        matches!(self, MergeOutcome::Merged { conflicts, .. } if !conflicts.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> Option<ObjectId> {
        Some(s.as_bytes().into())
    }

    #[test]
    fn test_unchanged_in_other_keeps_current() {
        assert_eq!(classify(id("a"), id("c"), id("a")), PathAction::Keep);
        assert_eq!(classify(id("a"), None, id("a")), PathAction::Keep);
        assert_eq!(classify(None, id("c"), None), PathAction::Keep);
    }

    #[test]
    fn test_changed_only_in_other_is_adopted() {
        assert_eq!(classify(id("a"), id("a"), id("o")), PathAction::Adopt(id("o").unwrap()));
        assert_eq!(classify(None, None, id("o")), PathAction::Adopt(id("o").unwrap()));
    }

    #[test]
    fn test_deleted_only_in_other_is_removed() {
        assert_eq!(classify(id("a"), id("a"), None), PathAction::Remove);
    }

    #[test]
    fn test_same_change_on_both_sides_is_kept() {
        assert_eq!(classify(id("a"), id("x"), id("x")), PathAction::Keep);
        assert_eq!(classify(id("a"), None, None), PathAction::Keep);
    }

    #[test]
    fn test_divergent_changes_conflict() {
        assert_eq!(
            classify(id("a"), id("c"), id("o")),
            PathAction::Conflict { current: id("c"), other: id("o") }
        );
        assert_eq!(
            classify(id("a"), None, id("o")),
            PathAction::Conflict { current: None, other: id("o") }
        );
        assert_eq!(
            classify(id("a"), id("c"), None),
            PathAction::Conflict { current: id("c"), other: None }
        );
        assert_eq!(
            classify(None, id("c"), id("o")),
            PathAction::Conflict { current: id("c"), other: id("o") }
        );
    }

    #[test]
    fn test_plan_covers_union_of_paths() {
        let snap = |entries: &[(&str, &str)]| -> Snapshot {
            entries
                .iter()
                .map(|(p, c)| (p.to_string(), id(c).unwrap()))
                .collect()
        };
        let base = snap(&[("f", "f"), ("g", "g"), ("k", "k")]);
        let current = snap(&[("f", "f"), ("g", "g2"), ("k", "k"), ("mine", "m")]);
        let other = snap(&[("f", "f2"), ("g", "g3"), ("theirs", "t")]);
        let plan = MergePlan::new(&base, &current, &other);
        let actions: Vec<_> = plan.iter().collect();
        assert_eq!(
            actions,
            vec![
                ("f", PathAction::Adopt(id("f2").unwrap())),
                ("g", PathAction::Conflict { current: id("g2"), other: id("g3") }),
                ("k", PathAction::Remove),
                ("theirs", PathAction::Adopt(id("t").unwrap())),
            ]
        );
        assert_eq!(plan.conflicts(), vec![String::from("g")]);
    }

    #[test]
    fn test_conflict_marker_format() {
        assert_eq!(
            conflict_marker(b"A\n", b"B\n"),
            b"<<<<<<< HEAD\nA\n=======\nB\n>>>>>>>\n".to_vec()
        );
        assert_eq!(
            conflict_marker(b"", b"B\n"),
            b"<<<<<<< HEAD\n=======\nB\n>>>>>>>\n".to_vec()
        );
    }
}

//! Ancestry queries over the commit DAG.
//!
//! Edges run from a commit to its parents: the first parent, then the
//! merged-in parent. Traversals are iterative and keep a visited set, so
//! history shared by several branches is walked once.

use std::collections::{BTreeSet, VecDeque};

use crate::{
    database::Database,
    error::{Error, Result},
    object_id::ObjectId,
    object_store::ObjectStore,
};

pub trait CommitGraph {
    /// The zero to two parents of `id`, first parent first.
    fn parents_of(&self, id: ObjectId) -> Result<Vec<ObjectId>>;

    /// Every commit reachable from `id` through any parent edge, `id`
    /// included.
    fn ancestor_set(&self, id: ObjectId) -> Result<BTreeSet<ObjectId>> {
        let mut seen = BTreeSet::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if !seen.insert(next) {
                continue;
            }
            stack.extend(
                self.parents_of(next)?
                    .into_iter()
                    .filter(|parent| !seen.contains(parent)),
            );
        }
        Ok(seen)
    }

    /// The merge base of `a` and `b`: the first ancestor of `b` met while
    /// walking breadth-first from `a`, parents before merged-in parents.
    ///
    /// In criss-cross histories this is the first common ancestor in
    /// discovery order from `a`, which is not necessarily the lowest one.
    fn lowest_common_ancestor(&self, a: ObjectId, b: ObjectId) -> Result<Option<ObjectId>> {
        let of_b = self.ancestor_set(b)?;
        let mut seen = BTreeSet::from([a]);
        let mut queue = VecDeque::from([a]);
        while let Some(next) = queue.pop_front() {
            if of_b.contains(&next) {
                log::debug!("merge base of {} and {} is {}", a, b, next);
                return Ok(Some(next));
            }
            for parent in self.parents_of(next)? {
                if seen.insert(parent) {
                    queue.push_back(parent);
                }
            }
        }
        Ok(None)
    }

    /// `id` followed by its first-parent chain back to the root.
    fn first_parent_history(&self, id: ObjectId) -> Result<Vec<ObjectId>> {
        let mut history = vec![id];
        let mut current = id;
        while let Some(&parent) = self.parents_of(current)?.first() {
            history.push(parent);
            current = parent;
        }
        Ok(history)
    }
}

impl<S> CommitGraph for Database<S>
where
    S: ObjectStore,
    Error: From<S::Error>,
{
    fn parents_of(&self, id: ObjectId) -> Result<Vec<ObjectId>> {
        Ok(self.get_commit(id)?.parents)
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, collections::BTreeMap};

    use super::*;

    /// A graph given directly as adjacency lists, counting lookups.
    #[derive(Default)]
    struct Dag {
        edges: BTreeMap<ObjectId, Vec<ObjectId>>,
        lookups: RefCell<usize>,
    }

    fn node(name: &str) -> ObjectId {
        name.as_bytes().into()
    }

    impl Dag {
        fn with(mut self, name: &str, parents: &[&str]) -> Self {
            self.edges
                .insert(node(name), parents.iter().map(|p| node(p)).collect());
            self
        }
    }

    impl CommitGraph for Dag {
        fn parents_of(&self, id: ObjectId) -> Result<Vec<ObjectId>> {
            *self.lookups.borrow_mut() += 1;
            self.edges.get(&id).cloned().ok_or(Error::MissingObject(id))
        }
    }

    //   root - a - b ----- m
    //           \         /
    //            c ----- d
    fn branched() -> Dag {
        Dag::default()
            .with("root", &[])
            .with("a", &["root"])
            .with("b", &["a"])
            .with("c", &["a"])
            .with("d", &["c"])
            .with("m", &["b", "d"])
    }

    #[test]
    fn test_ancestor_set_is_inclusive() {
        let dag = branched();
        let set = dag.ancestor_set(node("d")).unwrap();
        let expected: BTreeSet<_> = ["d", "c", "a", "root"].iter().map(|n| node(n)).collect();
        assert_eq!(set, expected);
    }

    #[test]
    fn test_ancestor_set_visits_shared_history_once() {
        let dag = branched();
        let set = dag.ancestor_set(node("m")).unwrap();
        assert_eq!(set.len(), 6);
        assert_eq!(*dag.lookups.borrow(), 6);
    }

    #[test]
    fn test_lca_of_divergent_branches() {
        let dag = branched();
        assert_eq!(
            dag.lowest_common_ancestor(node("b"), node("d")).unwrap(),
            Some(node("a"))
        );
    }

    #[test]
    fn test_lca_when_one_side_is_ancestor() {
        let dag = branched();
        assert_eq!(
            dag.lowest_common_ancestor(node("a"), node("d")).unwrap(),
            Some(node("a"))
        );
        assert_eq!(
            dag.lowest_common_ancestor(node("m"), node("d")).unwrap(),
            Some(node("d"))
        );
    }

    #[test]
    fn test_lca_tie_break_follows_bfs_order_from_first_argument() {
        // Criss-cross: x and y both merge p and q, in opposite parent order.
        let dag = Dag::default()
            .with("root", &[])
            .with("p", &["root"])
            .with("q", &["root"])
            .with("x", &["p", "q"])
            .with("y", &["q", "p"]);
        assert_eq!(
            dag.lowest_common_ancestor(node("x"), node("y")).unwrap(),
            Some(node("p"))
        );
        assert_eq!(
            dag.lowest_common_ancestor(node("y"), node("x")).unwrap(),
            Some(node("q"))
        );
    }

    #[test]
    fn test_lca_of_unrelated_histories() {
        let dag = Dag::default().with("a", &[]).with("b", &[]);
        assert_eq!(dag.lowest_common_ancestor(node("a"), node("b")).unwrap(), None);
    }

    #[test]
    fn test_first_parent_history_skips_merged_in_side() {
        let dag = branched();
        let history = dag.first_parent_history(node("m")).unwrap();
        let expected: Vec<_> = ["m", "b", "a", "root"].iter().map(|n| node(n)).collect();
        assert_eq!(history, expected);
    }
}

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{
    error::{Error, Result},
    object_id::ObjectId,
};

/// Name of the branch a fresh repository starts on.
pub const DEFAULT_BRANCH: &str = "master";

/// Branch heads plus the name of the active branch. The active branch
/// always has a head.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branches {
    active: String,
    heads: BTreeMap<String, ObjectId>,
}

impl Branches {
    /// A table holding only [`DEFAULT_BRANCH`], pointing at `root`.
    pub fn new(root: ObjectId) -> Self {
        Branches {
            active: String::from(DEFAULT_BRANCH),
            heads: [(String::from(DEFAULT_BRANCH), root)].into_iter().collect(),
        }
    }

    pub fn active(&self) -> &str {
        &self.active
    }

    pub fn active_head(&self) -> Result<ObjectId> {
        self.head(&self.active)
    }

    pub fn head(&self, branch: &str) -> Result<ObjectId> {
        self.heads
            .get(branch)
            .copied()
            .ok_or_else(|| Error::NoSuchBranch(branch.to_string()))
    }

    pub fn exists(&self, branch: &str) -> bool {
        self.heads.contains_key(branch)
    }

    /// Branch names with their heads, in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, ObjectId)> + '_ {
        self.heads.iter().map(|(name, id)| (name.as_str(), *id))
    }

    pub fn create(&mut self, branch: &str, head: ObjectId) -> Result<()> {
        if self.exists(branch) {
            return Err(Error::BranchExists(branch.to_string()));
        }
        log::info!("creating branch {} at {}", branch, head);
        self.heads.insert(branch.to_string(), head);
        Ok(())
    }

    pub fn remove(&mut self, branch: &str) -> Result<ObjectId> {
        if !self.exists(branch) {
            return Err(Error::NoSuchBranch(branch.to_string()));
        }
        if branch == self.active {
            return Err(Error::RemoveActiveBranch(branch.to_string()));
        }
        log::info!("removing branch {}", branch);
        self.heads
            .remove(branch)
            .ok_or_else(|| Error::NoSuchBranch(branch.to_string()))
    }

    /// Moves the active branch's head.
    pub fn advance(&mut self, head: ObjectId) {
        log::info!("moving {} to {}", self.active, head);
        self.heads.insert(self.active.clone(), head);
    }

    pub fn set_active(&mut self, branch: &str) -> Result<()> {
        if !self.exists(branch) {
            return Err(Error::NoSuchBranch(branch.to_string()));
        }
        log::info!("switching active branch to {}", branch);
        self.active = branch.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ObjectId {
        s.as_bytes().into()
    }

    #[test]
    fn test_new_table_starts_on_default_branch() {
        let branches = Branches::new(id("root"));
        assert_eq!(branches.active(), "master");
        assert_eq!(branches.active_head().unwrap(), id("root"));
    }

    #[test]
    fn test_create_and_remove() {
        let mut branches = Branches::new(id("root"));
        branches.create("other", id("root")).unwrap();
        assert!(matches!(
            branches.create("other", id("x")),
            Err(Error::BranchExists(_))
        ));
        assert!(matches!(
            branches.remove("master"),
            Err(Error::RemoveActiveBranch(_))
        ));
        assert_eq!(branches.remove("other").unwrap(), id("root"));
        assert!(matches!(branches.remove("other"), Err(Error::NoSuchBranch(_))));
    }

    #[test]
    fn test_advance_moves_only_active_branch() {
        let mut branches = Branches::new(id("root"));
        branches.create("other", id("root")).unwrap();
        branches.set_active("other").unwrap();
        branches.advance(id("next"));
        assert_eq!(branches.head("other").unwrap(), id("next"));
        assert_eq!(branches.head("master").unwrap(), id("root"));
        let names: Vec<_> = branches.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["master", "other"]);
    }
}

//! The operations a user runs against a repository.
//!
//! A [`Repository`] owns its state explicitly: the object database, the
//! branch table, the staging index, and the working tree. Every operation
//! checks all of its preconditions, obstructions included, before it
//! touches a file or a field, so a failed operation leaves everything as
//! it was. Persisting the branch table and index is the caller's job.

use std::collections::BTreeSet;

use chrono::Utc;

use crate::{
    branches::Branches,
    commit::{Commit, Snapshot},
    database::Database,
    error::{Error, Result},
    graph::CommitGraph,
    merge::{conflict_marker, MergeOutcome, MergePlan, PathAction},
    object_id::ObjectId,
    object_store::ObjectStore,
    report::{LogEntry, Modification, Status},
    staging::StagingIndex,
    worktree::WorkTree,
};

#[derive(Debug)]
pub struct Repository<S> {
    database: Database<S>,
    branches: Branches,
    index: StagingIndex,
    worktree: WorkTree,
}

impl<S> Repository<S>
where
    S: ObjectStore,
    Error: From<S::Error>,
{
    /// Creates the root commit and a [`crate::branches::DEFAULT_BRANCH`]
    /// pointing at it.
    pub fn init(mut database: Database<S>, worktree: WorkTree) -> Result<Self> {
        let root = database.put_commit(&Commit::root())?;
        Ok(Repository {
            database,
            branches: Branches::new(root),
            index: StagingIndex::new(),
            worktree,
        })
    }

    /// Assembles a repository from persisted parts, refusing branch heads
    /// that do not resolve to a stored commit.
    pub fn open(
        database: Database<S>,
        branches: Branches,
        index: StagingIndex,
        worktree: WorkTree,
    ) -> Result<Self> {
        for (branch, id) in branches.iter() {
            if !database.has_commit(id)? {
                return Err(Error::DanglingReference {
                    branch: branch.to_string(),
                    id,
                });
            }
        }
        Ok(Repository {
            database,
            branches,
            index,
            worktree,
        })
    }

    pub fn database(&self) -> &Database<S> {
        &self.database
    }

    pub fn branches(&self) -> &Branches {
        &self.branches
    }

    pub fn index(&self) -> &StagingIndex {
        &self.index
    }

    pub fn worktree(&self) -> &WorkTree {
        &self.worktree
    }

    pub fn head_id(&self) -> Result<ObjectId> {
        self.branches.active_head()
    }

    pub fn head(&self) -> Result<Commit> {
        self.database.get_commit(self.head_id()?)
    }

    /// Stages the working-tree content of `path`. Returns whether an
    /// addition is now pending; content matching the head is not.
    pub fn add(&mut self, path: &str) -> Result<bool> {
        let content = self
            .worktree
            .read(path)?
            .ok_or_else(|| Error::FileDoesNotExist(path.to_string()))?;
        let tracked = self.head()?.blob(path);
        let blob = ObjectId::from(&content);
        if tracked != Some(blob) {
            self.database.put_blob(&content)?;
        }
        Ok(self.index.stage_add(path, blob, tracked))
    }

    pub fn commit(&mut self, message: &str) -> Result<ObjectId> {
        if message.trim().is_empty() {
            return Err(Error::EmptyMessage);
        }
        if self.index.is_clean() {
            return Err(Error::NothingToCommit);
        }
        let parent = self.head_id()?;
        let snapshot = self.index.apply(&self.database.get_commit(parent)?.snapshot);
        self.record(message.to_string(), vec![parent], snapshot)
    }

    /// Writes a commit on top of the active branch and clears the index.
    fn record(
        &mut self,
        message: String,
        parents: Vec<ObjectId>,
        snapshot: Snapshot,
    ) -> Result<ObjectId> {
        let commit = Commit::new(message, Utc::now(), parents, snapshot);
        let id = self.database.put_commit(&commit)?;
        self.branches.advance(id);
        self.index.clear();
        Ok(id)
    }

    /// Unstages `path` and, when the head tracks it, stages its removal
    /// and deletes it from the working tree.
    pub fn rm(&mut self, path: &str) -> Result<()> {
        self.worktree.validate(path)?;
        let tracked = self.head()?.tracks(path);
        if !tracked && self.index.staged(path).is_none() {
            return Err(Error::NothingToRemove(path.to_string()));
        }
        if tracked {
            self.worktree.remove(path)?;
        }
        self.index.stage_remove(path, tracked);
        Ok(())
    }

    fn entry(&self, id: ObjectId) -> Result<LogEntry> {
        Ok(LogEntry {
            id,
            commit: self.database.get_commit(id)?,
        })
    }

    /// The active head and its first-parent ancestors, newest first.
    pub fn log(&self) -> Result<Vec<LogEntry>> {
        self.database
            .first_parent_history(self.head_id()?)?
            .into_iter()
            .map(|id| self.entry(id))
            .collect()
    }

    /// Every stored commit, newest first.
    pub fn global_log(&self) -> Result<Vec<LogEntry>> {
        let mut entries = self
            .database
            .commit_ids()?
            .into_iter()
            .map(|id| self.entry(id))
            .collect::<Result<Vec<_>>>()?;
        entries.sort_by(|a, b| {
            b.commit
                .timestamp
                .cmp(&a.commit.timestamp)
                .then(a.id.cmp(&b.id))
        });
        Ok(entries)
    }

    /// Ids of the commits whose message is exactly `message`.
    pub fn find(&self, message: &str) -> Result<Vec<ObjectId>> {
        let mut found = Vec::new();
        for id in self.database.commit_ids()? {
            if self.database.get_commit(id)?.message == message {
                found.push(id);
            }
        }
        if found.is_empty() {
            return Err(Error::NoCommitWithMessage(message.to_string()));
        }
        Ok(found)
    }

    /// Restores `path` to its content in the active head.
    pub fn checkout_path(&self, path: &str) -> Result<()> {
        self.checkout_path_in(self.head_id()?, path)
    }

    /// Restores `path` to its content in the commit named by the
    /// (possibly abbreviated) id `commit`.
    pub fn checkout_path_at(&self, commit: &str, path: &str) -> Result<()> {
        self.checkout_path_in(self.database.resolve_commit(commit)?, path)
    }

    fn checkout_path_in(&self, id: ObjectId, path: &str) -> Result<()> {
        self.worktree.validate(path)?;
        let blob = self
            .database
            .get_commit(id)?
            .blob(path)
            .ok_or_else(|| Error::PathNotInCommit(path.to_string()))?;
        let content = self.database.get_blob(blob)?;
        self.worktree.write(path, &content)
    }

    /// Switches the working tree and the active branch to `branch`.
    pub fn checkout_branch(&mut self, branch: &str) -> Result<()> {
        if branch == self.branches.active() {
            return Err(Error::NoOpCheckout(branch.to_string()));
        }
        let head = self.branches.head(branch).map_err(|err| match err {
            Error::NoSuchBranch(name) => Error::NoSuchCheckoutBranch(name),
            err => err,
        })?;
        let target = self.database.get_commit(head)?;
        self.materialize(&self.head()?, &target)?;
        self.branches.set_active(branch)
    }

    pub fn branch(&mut self, branch: &str) -> Result<()> {
        let head = self.head_id()?;
        self.branches.create(branch, head)
    }

    pub fn rm_branch(&mut self, branch: &str) -> Result<()> {
        self.branches.remove(branch).map(|_| ())
    }

    /// Moves the active branch to the commit named by `commit`, checking
    /// out its files and clearing the index.
    pub fn reset(&mut self, commit: &str) -> Result<ObjectId> {
        let id = self.database.resolve_commit(commit)?;
        let target = self.database.get_commit(id)?;
        self.materialize(&self.head()?, &target)?;
        self.index.clear();
        self.branches.advance(id);
        Ok(id)
    }

    /// Working-tree paths that stand in the way of writing `writes` once
    /// `removals` are gone: untracked files at a written path, files where
    /// a written path needs a directory, and files inside a directory
    /// where a written path needs a file.
    fn obstructions<'a>(
        &self,
        tracked: &Snapshot,
        writes: impl IntoIterator<Item = &'a str>,
        removals: &BTreeSet<&str>,
    ) -> Result<Vec<String>> {
        let mut blocked = BTreeSet::new();
        for path in writes {
            if self.worktree.exists(path)? {
                if !tracked.contains_key(path) {
                    blocked.insert(path.to_string());
                }
            } else if self.worktree.is_dir(path)? {
                for inner in self.worktree.files_under(path)? {
                    if !removals.contains(inner.as_str()) {
                        blocked.insert(inner);
                    }
                }
            }
            for (end, _) in path.match_indices('/') {
                let parent = &path[..end];
                if !removals.contains(parent) && self.worktree.exists(parent)? {
                    blocked.insert(parent.to_string());
                }
            }
        }
        Ok(blocked.into_iter().collect())
    }

    fn check_obstructions<'a>(
        &self,
        tracked: &Snapshot,
        writes: impl IntoIterator<Item = &'a str>,
        removals: &BTreeSet<&str>,
    ) -> Result<()> {
        let blocked = self.obstructions(tracked, writes, removals)?;
        if blocked.is_empty() {
            Ok(())
        } else {
            log::warn!("untracked files in the way: {:?}", blocked);
            Err(Error::UntrackedObstruction(blocked))
        }
    }

    /// Replaces the files of `from` in the working tree with those of `to`.
    fn materialize(&self, from: &Commit, to: &Commit) -> Result<()> {
        let removals: BTreeSet<&str> = from
            .snapshot
            .keys()
            .filter(|path| !to.tracks(path))
            .map(String::as_str)
            .collect();
        let writes = to.snapshot.keys().map(String::as_str);
        self.check_obstructions(&from.snapshot, writes, &removals)?;
        let contents = to
            .snapshot
            .iter()
            .map(|(path, blob)| Ok((path, self.database.get_blob(*blob)?)))
            .collect::<Result<Vec<_>>>()?;
        for path in removals {
            self.worktree.remove(path)?;
        }
        for (path, content) in contents {
            self.worktree.write(path, &content)?;
        }
        Ok(())
    }

    /// Merges the head of `branch` into the active branch.
    ///
    /// Conflicts do not abort the merge: conflicted paths are committed
    /// with markers and listed in the outcome.
    pub fn merge(&mut self, branch: &str) -> Result<MergeOutcome> {
        let other_id = self.branches.head(branch)?;
        if !self.index.is_clean() {
            return Err(Error::UncommittedChanges);
        }
        let current_id = self.head_id()?;
        if current_id == other_id {
            return Err(Error::SelfMerge);
        }
        let base_id = self
            .database
            .lowest_common_ancestor(current_id, other_id)?
            .ok_or(Error::Unrelated(current_id, other_id))?;
        if base_id == other_id {
            return Err(Error::AlreadyAncestor);
        }
        let current = self.database.get_commit(current_id)?;
        let other = self.database.get_commit(other_id)?;

        if base_id == current_id {
            self.materialize(&current, &other)?;
            self.branches.advance(other_id);
            log::info!("fast-forwarded {} to {}", self.branches.active(), other_id);
            return Ok(MergeOutcome::FastForwarded(other_id));
        }

        let base = self.database.get_commit(base_id)?;
        let plan = MergePlan::new(&base.snapshot, &current.snapshot, &other.snapshot);

        let mut writes = Vec::new();
        let mut removals = BTreeSet::new();
        for (path, action) in plan.iter() {
            match action {
                PathAction::Keep => {}
                PathAction::Adopt(blob) => writes.push((path, self.database.get_blob(blob)?)),
                PathAction::Remove => {
                    removals.insert(path);
                }
                PathAction::Conflict { current: ours, other: theirs } => {
                    let ours = self.content_or_empty(ours)?;
                    let theirs = self.content_or_empty(theirs)?;
                    writes.push((path, conflict_marker(&ours, &theirs)));
                }
            }
        }

        self.check_obstructions(
            &current.snapshot,
            writes.iter().map(|(path, _)| *path),
            &removals,
        )?;

        let mut staged = StagingIndex::new();
        for path in removals {
            self.worktree.remove(path)?;
            staged.stage_remove(path, current.tracks(path));
        }
        for (path, content) in writes {
            self.worktree.write(path, &content)?;
            let blob = self.database.put_blob(&content)?;
            staged.stage_add(path, blob, current.blob(path));
        }

        let conflicts = plan.conflicts();
        if !conflicts.is_empty() {
            log::warn!("merge of {} left conflicts in {:?}", branch, conflicts);
        }
        let message = format!("Merged {} into {}.", branch, self.branches.active());
        let snapshot = staged.apply(&current.snapshot);
        let commit = self.record(message, vec![current_id, other_id], snapshot)?;
        Ok(MergeOutcome::Merged { commit, conflicts })
    }

    fn content_or_empty(&self, blob: Option<ObjectId>) -> Result<Vec<u8>> {
        match blob {
            Some(id) => self.database.get_blob(id),
            None => Ok(Vec::new()),
        }
    }

    pub fn status(&self) -> Result<Status> {
        let head = self.head()?;
        let files = self.worktree.files()?;
        let digest_of = |path: &str| files.get(path).map(ObjectId::from);

        let mut modified = Vec::new();
        let expected = head
            .snapshot
            .iter()
            .filter(|(path, _)| !self.index.is_removed(path) && self.index.staged(path).is_none())
            .chain(self.index.additions().iter());
        for (path, blob) in expected {
            match digest_of(path) {
                None => modified.push((path.clone(), Modification::Deleted)),
                Some(digest) if digest != *blob => {
                    modified.push((path.clone(), Modification::Modified))
                }
                Some(_) => {}
            }
        }
        modified.sort();

        let untracked = files
            .keys()
            .filter(|path| {
                self.index.is_removed(path)
                    || (!head.tracks(path) && self.index.staged(path).is_none())
            })
            .cloned()
            .collect();

        Ok(Status {
            active: self.branches.active().to_string(),
            branches: self.branches.iter().map(|(name, _)| name.to_string()).collect(),
            staged: self.index.additions().keys().cloned().collect(),
            removed: self.index.removals().iter().cloned().collect(),
            modified,
            untracked,
        })
    }
}

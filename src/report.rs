use std::fmt::Display;

use crate::{commit::Commit, object_id::ObjectId};

const DATE_FORMAT: &str = "%a %b %-d %H:%M:%S %Y %z";

/// One commit as shown by `log` and `global-log`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub id: ObjectId,
    pub commit: Commit,
}

impl Display for LogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "===")?;
        writeln!(f, "commit {}", self.id)?;
        let parents = (self.commit.first_parent(), self.commit.merge_parent());
        if let (Some(first), Some(merged)) = parents {
            writeln!(f, "Merge: {} {}", first.short(), merged.short())?;
        }
        writeln!(f, "Date: {}", self.commit.timestamp.format(DATE_FORMAT))?;
        writeln!(f, "{}", self.commit.message)
    }
}

/// Why a file shows up under "Modifications Not Staged For Commit".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Modification {
    Modified,
    Deleted,
}

/// A snapshot of branches, staged changes, and working-tree drift.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Status {
    pub active: String,
    pub branches: Vec<String>,
    pub staged: Vec<String>,
    pub removed: Vec<String>,
    pub modified: Vec<(String, Modification)>,
    pub untracked: Vec<String>,
}

impl Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Branches ===")?;
        for branch in &self.branches {
            if *branch == self.active {
                writeln!(f, "*{}", branch)?;
            } else {
                writeln!(f, "{}", branch)?;
            }
        }
        writeln!(f)?;
        writeln!(f, "=== Staged Files ===")?;
        for path in &self.staged {
            writeln!(f, "{}", path)?;
        }
        writeln!(f)?;
        writeln!(f, "=== Removed Files ===")?;
        for path in &self.removed {
            writeln!(f, "{}", path)?;
        }
        writeln!(f)?;
        writeln!(f, "=== Modifications Not Staged For Commit ===")?;
        for (path, modification) in &self.modified {
            match modification {
                Modification::Modified => writeln!(f, "{} (modified)", path)?,
                Modification::Deleted => writeln!(f, "{} (deleted)", path)?,
            }
        }
        writeln!(f)?;
        writeln!(f, "=== Untracked Files ===")?;
        for path in &self.untracked {
            writeln!(f, "{}", path)?;
        }
        Ok(())
    }
}

use std::{
    fs::{create_dir_all, File},
    io::{BufReader, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::{
    branches::Branches,
    database::Database,
    error::{Error, Result},
    object_store::{directory::DirectoryObjectStore, ObjectStore},
    repository::Repository,
    staging::StagingIndex,
    worktree::{Ignores, WorkTree},
};

/// Name of the metadata directory at the root of a working tree.
pub const DOT_REV: &str = ".rev";

const BLOBS: &str = "blobs";
const COMMITS: &str = "commits";
const REFS: &str = "refs";
const INDEX: &str = "index";
const IGNORES: &str = "ignores";

/// A wrapper for the path of the .rev directory which has a number of utilities defined on it.
///
/// ```text
/// .rev/
///   blobs/    file contents, by id
///   commits/  commit records, by id
///   refs      branch heads and the active branch
///   index     staged additions and removals
///   ignores   names skipped in the working tree
/// ```
pub struct DotRev {
    root: PathBuf,
    worktree: PathBuf,
}

impl DotRev {
    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    /// Creates `.rev` under `worktree` with a root commit on the default
    /// branch.
    pub fn init(worktree: &Path) -> Result<Self> {
        let root = worktree.join(DOT_REV);
        if root.try_exists()? {
            return Err(Error::AlreadyInitialized);
        }
        log::info!("initializing {:?}", root);
        create_dir_all(&root)?;
        let dot_rev = DotRev {
            root,
            worktree: worktree.to_path_buf(),
        };
        write_json(&Ignores::default(), &dot_rev.root.join(IGNORES))?;
        let repository = Repository::init(dot_rev.database()?, dot_rev.worktree_at()?)?;
        dot_rev.save(&repository)?;
        Ok(dot_rev)
    }

    pub fn existing(worktree: &Path) -> Result<Self> {
        let root = worktree.join(DOT_REV);
        if !root.is_dir() {
            return Err(Error::NotInitialized);
        }
        Ok(DotRev {
            root,
            worktree: worktree.to_path_buf(),
        })
    }

    fn database(&self) -> Result<Database<DirectoryObjectStore>> {
        Ok(Database::new(
            DirectoryObjectStore::new(self.root.join(BLOBS))?,
            DirectoryObjectStore::new(self.root.join(COMMITS))?,
        ))
    }

    pub fn ignores(&self) -> Result<Ignores> {
        read_json(&self.root.join(IGNORES))
    }

    fn worktree_at(&self) -> Result<WorkTree> {
        Ok(WorkTree::new(self.worktree.clone(), self.ignores()?))
    }

    /// Loads the repository rooted here.
    pub fn open(&self) -> Result<Repository<DirectoryObjectStore>> {
        let branches: Branches = read_json(&self.root.join(REFS))?;
        let index: StagingIndex = read_json(&self.root.join(INDEX))?;
        Repository::open(self.database()?, branches, index, self.worktree_at()?)
    }

    /// Persists the branch table and staging index of `repository`.
    pub fn save<S>(&self, repository: &Repository<S>) -> Result<()>
    where
        S: ObjectStore,
        Error: From<S::Error>,
    {
        log::debug!("saving refs and index to {:?}", self.root);
        write_json(repository.branches(), &self.root.join(REFS))?;
        write_json(repository.index(), &self.root.join(INDEX))
    }
}

fn read_json<A: for<'de> Deserialize<'de>>(path: &Path) -> Result<A> {
    Ok(serde_json::from_reader(BufReader::new(File::open(path)?))?)
}

/// Replaces `path` in one step, so readers never see a partial file.
fn write_json<A: Serialize>(thing: &A, path: &Path) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut file = NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut file, thing)?;
    file.flush()?;
    file.persist(path).map_err(|err| err.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_then_open() {
        let dir = tempfile::tempdir().unwrap();
        let dot_rev = DotRev::init(dir.path()).unwrap();
        assert!(dot_rev.root().join(REFS).is_file());
        let repo = dot_rev.open().unwrap();
        assert_eq!(repo.branches().active(), "master");
        assert_eq!(repo.log().unwrap().len(), 1);
        assert!(matches!(DotRev::init(dir.path()), Err(Error::AlreadyInitialized)));
    }

    #[test]
    fn test_existing_requires_dot_rev() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(DotRev::existing(dir.path()), Err(Error::NotInitialized)));
    }

    #[test]
    fn test_state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let dot_rev = DotRev::init(dir.path()).unwrap();
        let mut repo = dot_rev.open().unwrap();
        std::fs::write(dir.path().join("f.txt"), "wug.txt").unwrap();
        repo.add("f.txt").unwrap();
        dot_rev.save(&repo).unwrap();

        let mut repo = DotRev::existing(dir.path()).unwrap().open().unwrap();
        assert!(repo.index().staged("f.txt").is_some());
        let id = repo.commit("add f").unwrap();
        repo.branch("other").unwrap();
        dot_rev.save(&repo).unwrap();

        let repo = dot_rev.open().unwrap();
        assert_eq!(repo.head_id().unwrap(), id);
        assert_eq!(repo.branches().head("other").unwrap(), id);
        assert!(repo.index().is_clean());
        assert!(!repo.worktree().files().unwrap().keys().any(|p| p.starts_with(DOT_REV)));
    }
}

use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    io::ErrorKind,
    path::{Component, Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Top-level names never treated as part of the working tree.
#[derive(PartialEq, Eq, Debug, Clone, Serialize, Deserialize)]
pub struct Ignores {
    set: BTreeSet<String>,
}

impl Default for Ignores {
    fn default() -> Self {
        Ignores {
            set: [".git", "target"].into_iter().map(String::from).collect(),
        }
    }
}

impl Ignores {
    fn contains(&self, name: &str) -> bool {
        name == crate::dot_rev::DOT_REV || self.set.contains(name)
    }
}

/// The checked-out files of a repository, addressed by `/`-separated
/// paths relative to its root.
#[derive(Debug, Clone)]
pub struct WorkTree {
    root: PathBuf,
    ignores: Ignores,
}

impl WorkTree {
    pub fn new(root: PathBuf, ignores: Ignores) -> Self {
        WorkTree { root, ignores }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Rejects paths that would escape the working tree or land in an
    /// ignored location.
    pub fn validate(&self, path: &str) -> Result<()> {
        let invalid = || Error::InvalidPath(path.to_string());
        let mut components = Path::new(path).components().peekable();
        if components.peek().is_none() {
            return Err(invalid());
        }
        let mut first = true;
        for component in components {
            match component {
                Component::Normal(name) => {
                    if first && self.ignores.contains(&name.to_string_lossy()) {
                        return Err(invalid());
                    }
                }
                _ => return Err(invalid()),
            }
            first = false;
        }
        Ok(())
    }

    fn full_path(&self, path: &str) -> Result<PathBuf> {
        self.validate(path)?;
        Ok(self.root.join(path))
    }

    pub fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.full_path(path)?.is_file())
    }

    pub fn is_dir(&self, path: &str) -> Result<bool> {
        Ok(self.full_path(path)?.is_dir())
    }

    /// The file's content, or `None` when it does not exist.
    pub fn read(&self, path: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.full_path(path)?) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    pub fn write(&self, path: &str, content: &[u8]) -> Result<()> {
        let full = self.full_path(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)?;
        }
        log::debug!("writing {:?}", full);
        fs::write(full, content)?;
        Ok(())
    }

    /// Deletes the file if present. Directories left empty are removed.
    pub fn remove(&self, path: &str) -> Result<()> {
        let full = self.full_path(path)?;
        if !full.is_file() {
            return Ok(());
        }
        fs::remove_file(&full)?;
        log::debug!("deleted {:?}", full);
        let mut dir = full.parent();
        while let Some(d) = dir {
            if d == self.root || fs::remove_dir(d).is_err() {
                break;
            }
            dir = d.parent();
        }
        Ok(())
    }

    /// Every file in the working tree with its content.
    pub fn files(&self) -> Result<BTreeMap<String, Vec<u8>>> {
        let mut files = BTreeMap::new();
        self.collect(&self.root, "", &mut files)?;
        Ok(files)
    }

    /// Paths of the files below the directory `path`.
    pub fn files_under(&self, path: &str) -> Result<Vec<String>> {
        let mut files = BTreeMap::new();
        self.collect(&self.full_path(path)?, path, &mut files)?;
        Ok(files.into_keys().collect())
    }

    fn collect(&self, dir: &Path, prefix: &str, files: &mut BTreeMap<String, Vec<u8>>) -> Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if prefix.is_empty() && self.ignores.contains(&name) {
                continue;
            }
            let path = if prefix.is_empty() {
                name
            } else {
                format!("{}/{}", prefix, name)
            };
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                self.collect(&entry.path(), &path, files)?;
            } else if file_type.is_file() {
                files.insert(path, fs::read(entry.path())?);
            } else {
                log::warn!("skipping {:?}: neither a file nor a directory", entry.path());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn worktree() -> (tempfile::TempDir, WorkTree) {
        let dir = tempfile::tempdir().unwrap();
        let worktree = WorkTree::new(dir.path().to_path_buf(), Ignores::default());
        (dir, worktree)
    }

    #[test]
    fn test_write_read_remove() {
        let (_dir, worktree) = worktree();
        worktree.write("nested/f.txt", b"wug").unwrap();
        assert!(worktree.exists("nested/f.txt").unwrap());
        assert_eq!(worktree.read("nested/f.txt").unwrap(), Some(b"wug".to_vec()));
        worktree.remove("nested/f.txt").unwrap();
        assert_eq!(worktree.read("nested/f.txt").unwrap(), None);
        assert!(!worktree.root().join("nested").exists());
        worktree.remove("nested/f.txt").unwrap();
    }

    #[test]
    fn test_files_under_and_remove_skips_directories() {
        let (_dir, worktree) = worktree();
        worktree.write("z/inner.txt", b"i").unwrap();
        worktree.write("z/deep/more.txt", b"m").unwrap();
        assert!(worktree.is_dir("z").unwrap());
        assert!(!worktree.exists("z").unwrap());
        assert_eq!(
            worktree.files_under("z").unwrap(),
            vec!["z/deep/more.txt", "z/inner.txt"]
        );
        worktree.remove("z").unwrap();
        assert!(worktree.exists("z/inner.txt").unwrap());
    }

    #[test]
    fn test_files_skips_ignored_names() {
        let (dir, worktree) = worktree();
        worktree.write("a.txt", b"a").unwrap();
        worktree.write("sub/b.txt", b"b").unwrap();
        fs::create_dir_all(dir.path().join(".rev/blobs")).unwrap();
        fs::write(dir.path().join(".rev/refs"), b"{}").unwrap();
        fs::create_dir_all(dir.path().join("target")).unwrap();
        fs::write(dir.path().join("target/out"), b"x").unwrap();
        let names: Vec<_> = worktree.files().unwrap().into_keys().collect();
        assert_eq!(names, vec!["a.txt", "sub/b.txt"]);
    }

    #[test]
    fn test_validate_rejects_escaping_paths() {
        let (_dir, worktree) = worktree();
        assert!(worktree.validate("ok/file.txt").is_ok());
        for bad in ["", "/etc/passwd", "../up", "a/../b", ".rev/refs"] {
            assert!(
                matches!(worktree.validate(bad), Err(Error::InvalidPath(_))),
                "{:?} should be rejected",
                bad
            );
        }
    }
}

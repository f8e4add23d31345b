use std::{
    fs::{create_dir_all, read_dir, File},
    io::{ErrorKind, Write},
    path::PathBuf,
};

use crate::object_id::ObjectId;

use super::ObjectStore;

/// A persistent [`ObjectStore`] stored in a directory,
/// using the first two hexadecimal characters of the [`ObjectId`]
/// to determine which directory to place the binary object in
/// and creating a file with the rest of the hexadecimal characters
/// as the file name.
#[derive(Debug, Clone)]
pub struct DirectoryObjectStore {
    root: PathBuf,
}

impl DirectoryObjectStore {
    pub fn new(root: PathBuf) -> Result<Self, std::io::Error> {
        if !root.try_exists()? {
            log::info!("creating directory store root: {:?}", root);
            create_dir_all(&root)?;
        }
        Ok(Self { root })
    }

    fn path_of(&self, id: ObjectId) -> (PathBuf, PathBuf) {
        let s: String = id.to_string();
        let subdir_path = self.root.join(&s[0..2]);
        let path = subdir_path.join(&s[2..]);
        (subdir_path, path)
    }
}

impl ObjectStore for DirectoryObjectStore {
    type Error = std::io::Error;

    fn has(&self, id: ObjectId) -> Result<bool, Self::Error> {
        log::debug!("checking whether {} is contained in {:?}", id, self.root);
        self.path_of(id).1.try_exists()
    }

    fn read(&self, id: ObjectId) -> Result<Option<Vec<u8>>, Self::Error> {
        log::debug!("reading {} from {:?}", id, self.root);
        match std::fs::read(self.path_of(id).1) {
            Ok(v) => Ok(Some(v)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn insert(&mut self, object: &[u8]) -> Result<ObjectId, Self::Error> {
        let id: ObjectId = object.into();
        let (subdir_path, path) = self.path_of(id);
        if path.try_exists()? {
            log::debug!("{:?} already exists", path);
            return Ok(id);
        }
        log::info!("inserting {} into {:?}", id, self.root);
        if !subdir_path.try_exists()? {
            log::debug!("creating subdir path {:?} in {:?}", subdir_path, self.root);
            create_dir_all(&subdir_path)?;
        }
        let mut f = File::options().create(true).write(true).truncate(true).open(path)?;
        f.write_all(object)?;
        Ok(id)
    }

    fn ids(&self) -> Result<Vec<ObjectId>, Self::Error> {
        let mut ids = Vec::new();
        for subdir in read_dir(&self.root)? {
            let subdir = subdir?;
            if !subdir.file_type()?.is_dir() {
                continue;
            }
            let prefix = subdir.file_name().to_string_lossy().into_owned();
            for entry in read_dir(subdir.path())? {
                let name = entry?.file_name().to_string_lossy().into_owned();
                match format!("{}{}", prefix, name).parse::<ObjectId>() {
                    Ok(id) => ids.push(id),
                    Err(err) => log::warn!("skipping stray store entry: {}", err),
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}

#[test]
fn test_directory_object_store() {
    let tempdir = tempfile::tempdir().unwrap();
    let mut store = DirectoryObjectStore::new(tempdir.path().into()).unwrap();
    let id = store.insert(b"hello, world").unwrap();
    assert_eq!(store.insert(b"hello, world").unwrap(), id);
    let b: &[u8] = b"hello, world";
    assert!(store.has(b.into()).unwrap());
    assert_eq!(store.read(b.into()).unwrap(), Some(Vec::from(b)));
    assert_eq!(store.ids().unwrap(), vec![id]);
}

#[test]
fn test_directory_object_store_missing_entry() {
    let tempdir = tempfile::tempdir().unwrap();
    let store = DirectoryObjectStore::new(tempdir.path().join("store")).unwrap();
    let b: &[u8] = b"never inserted";
    assert!(!store.has(b.into()).unwrap());
    assert_eq!(store.read(b.into()).unwrap(), None);
    assert!(store.ids().unwrap().is_empty());
}

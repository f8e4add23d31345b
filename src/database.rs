use crate::{
    commit::Commit,
    error::{Error, Result},
    object_id::ObjectId,
    object_store::ObjectStore,
};

/// Blobs and commits, each held in its own [`ObjectStore`] so commits can
/// be enumerated without wading through file contents.
#[derive(Debug, Clone)]
pub struct Database<S> {
    blobs: S,
    commits: S,
}

impl<S> Database<S>
where
    S: ObjectStore,
    Error: From<S::Error>,
{
    pub fn new(blobs: S, commits: S) -> Self {
        Self { blobs, commits }
    }

    /// Stores `bytes` once; storing identical content again is a no-op
    /// returning the same id.
    pub fn put_blob(&mut self, bytes: &[u8]) -> Result<ObjectId> {
        Ok(self.blobs.insert(bytes)?)
    }

    pub fn get_blob(&self, id: ObjectId) -> Result<Vec<u8>> {
        self.blobs.read(id)?.ok_or(Error::MissingObject(id))
    }

    pub fn put_commit(&mut self, commit: &Commit) -> Result<ObjectId> {
        let id = self.commits.insert(&commit.to_bytes()?)?;
        log::info!("stored commit {} ({:?})", id, commit.message);
        Ok(id)
    }

    pub fn get_commit(&self, id: ObjectId) -> Result<Commit> {
        match self.commits.read(id)? {
            None => Err(Error::MissingObject(id)),
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
        }
    }

    pub fn has_commit(&self, id: ObjectId) -> Result<bool> {
        Ok(self.commits.has(id)?)
    }

    pub fn commit_ids(&self) -> Result<Vec<ObjectId>> {
        Ok(self.commits.ids()?)
    }

    /// Resolves a possibly abbreviated hexadecimal commit id.
    pub fn resolve_commit(&self, prefix: &str) -> Result<ObjectId> {
        if prefix.is_empty() || !crate::hex::is_hex(prefix) {
            return Err(Error::NoSuchCommit(prefix.to_string()));
        }
        let mut matches = self
            .commit_ids()?
            .into_iter()
            .filter(|id| id.has_prefix(prefix));
        match (matches.next(), matches.next()) {
            (Some(id), None) => Ok(id),
            (None, _) => Err(Error::NoSuchCommit(prefix.to_string())),
            (Some(_), Some(_)) => Err(Error::AmbiguousCommit(prefix.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object_store::in_memory::InMemoryObjectStore;

    fn database() -> Database<InMemoryObjectStore> {
        Database::new(InMemoryObjectStore::new(), InMemoryObjectStore::new())
    }

    #[test]
    fn test_blob_round_trip_and_dedup() {
        let mut db = database();
        let id = db.put_blob(b"wug.txt").unwrap();
        assert_eq!(db.put_blob(b"wug.txt").unwrap(), id);
        assert_eq!(db.blobs.len(), 1);
        assert_eq!(db.get_blob(id).unwrap(), b"wug.txt".to_vec());
    }

    #[test]
    fn test_missing_objects_are_not_found() {
        let db = database();
        let b: &[u8] = b"absent";
        let id = ObjectId::from(b);
        assert!(matches!(db.get_blob(id), Err(Error::MissingObject(x)) if x == id));
        assert!(matches!(db.get_commit(id), Err(Error::MissingObject(_))));
    }

    #[test]
    fn test_commit_identity_matches_store_key() {
        let mut db = database();
        let root = Commit::root();
        let id = db.put_commit(&root).unwrap();
        assert_eq!(id, root.id().unwrap());
        assert_eq!(db.get_commit(id).unwrap(), root);
        assert!(db.blobs.is_empty());
    }

    #[test]
    fn test_resolve_commit_prefix() {
        let mut db = database();
        let id = db.put_commit(&Commit::root()).unwrap();
        let hex = id.to_string();
        assert_eq!(db.resolve_commit(&hex[..6]).unwrap(), id);
        assert_eq!(db.resolve_commit(&hex).unwrap(), id);
        assert!(matches!(db.resolve_commit("xyz"), Err(Error::NoSuchCommit(_))));
        assert!(matches!(db.resolve_commit(""), Err(Error::NoSuchCommit(_))));
        let other = if hex.starts_with('0') { "1" } else { "0" };
        assert!(matches!(db.resolve_commit(other), Err(Error::NoSuchCommit(_))));
    }
}

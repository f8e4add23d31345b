use crate::object_id::ObjectId;

pub mod directory;
pub mod in_memory;

/// A write-once, content-addressed byte store. Entries are keyed by the
/// [`ObjectId`] of their bytes and can never be updated or deleted.
pub trait ObjectStore {
    type Error;

    fn has(&self, id: ObjectId) -> Result<bool, Self::Error>;

    fn read(&self, id: ObjectId) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Stores `object` unless an entry with the same id already exists,
    /// returning its id either way.
    fn insert(&mut self, object: &[u8]) -> Result<ObjectId, Self::Error>;

    /// Every id currently held, in ascending order.
    fn ids(&self) -> Result<Vec<ObjectId>, Self::Error>;
}

//! # Revision Control
//!
//! This is an implementation of a basic revision control system: a
//! content-addressed object store, an immutable commit graph, a staging
//! index, and three-way merging with conflict markers.

mod hex;

/// Branch heads and the active branch.
pub mod branches;
/// The immutable commit record.
pub mod commit;
/// Typed blob and commit storage over two [`object_store::ObjectStore`]s.
pub mod database;
/// The on-disk `.rev` layout.
pub mod dot_rev;
pub mod error;
/// Ancestry queries over the commit DAG.
pub mod graph;
/// Three-way merge classification.
pub mod merge;
/// Hash-based binary object identifier.
pub mod object_id;
/// Content addressible store API using the [`object_id::ObjectId`].
pub mod object_store;
/// Rendering of `log` and `status` output.
pub mod report;
pub mod repository;
/// Changes pending for the next commit.
pub mod staging;
/// Files of the working tree.
pub mod worktree;

pub use error::{Error, ErrorKind, Result};

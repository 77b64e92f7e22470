//! Atom storage.
//!
//! [`AtomStore`] is the interface inference and attention code is written
//! against; [`AtomSpace`] is the in-memory implementation. Snapshots move a
//! store's contents to and from a checksummed text format.

mod memory;
pub mod snapshot;
mod traits;

pub use memory::AtomSpace;
pub use snapshot::{ImportReport, SnapshotError, SnapshotHeader};
pub use traits::{AtomStore, StorageError};

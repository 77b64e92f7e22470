//! Abstract storage trait for atom stores.
//!
//! Inference and attention allocation are written against [`AtomStore`]
//! rather than a concrete backend. Every method is a short, self-contained
//! call; callers composing several calls observe a live store and must not
//! assume snapshot isolation between them.

use thiserror::Error;

use crate::atom::{Atom, AtomId, AtomKind};
use crate::attention::AttentionValue;
use crate::pattern::Pattern;
use crate::truth::TruthValue;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Atom not found.
    #[error("Atom not found: {0}")]
    AtomNotFound(AtomId),

    /// The store cannot hold another atom.
    #[error("Resource exhausted: store is limited to {limit} atoms")]
    ResourceExhausted {
        /// Configured or implied capacity.
        limit: usize,
    },

    /// Backend error.
    #[error("Storage backend error: {0}")]
    BackendError(String),
}

/// Storage trait for hypergraph atoms.
///
/// # Concurrency
/// - Structural changes (create/delete) and whole-store scans are serialized
///   per store.
/// - Truth and attention updates on an atom are atomic per atom and do not
///   contend with other atoms.
///
/// # Dangling references
/// Deleting an atom does not rewrite links that point at it. Ids are never
/// reused, so those references resolve to `None` from then on.
pub trait AtomStore: Send + Sync {
    /// Create a node with the next id and default truth/attention.
    fn create_node(&self, kind: AtomKind, label: Option<&str>) -> Result<Atom, StorageError>;

    /// Create a link. Outgoing ids are not checked for existence, so links
    /// may be built before the atoms they reference. Links that end up
    /// referencing each other in a cycle cannot be exported as a snapshot.
    fn create_link(&self, kind: AtomKind, outgoing: Vec<AtomId>) -> Result<Atom, StorageError>;

    /// Get an atom by id; `Ok(None)` when absent.
    fn get(&self, id: AtomId) -> Result<Option<Atom>, StorageError>;

    /// Delete an atom by id. Returns `AtomNotFound` if it does not exist.
    fn delete(&self, id: AtomId) -> Result<(), StorageError>;

    /// Allocate an id that will never be bound to an atom.
    fn reserve_id(&self) -> Result<AtomId, StorageError>;

    /// All live atoms in enumeration order.
    fn atoms(&self) -> Result<Vec<Atom>, StorageError>;

    /// Number of live atoms.
    fn len(&self) -> Result<usize, StorageError>;

    /// True when the store holds no atoms.
    fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }

    /// True if `id` resolves to a live atom.
    fn contains(&self, id: AtomId) -> Result<bool, StorageError> {
        Ok(self.get(id)?.is_some())
    }

    /// Every atom satisfying `predicate`, in enumeration order.
    fn query(&self, predicate: &dyn Fn(&Atom) -> bool) -> Result<Vec<Atom>, StorageError>;

    /// Every link whose outgoing set contains `id`, in enumeration order.
    fn incoming(&self, id: AtomId) -> Result<Vec<Atom>, StorageError>;

    /// Every atom structurally matching `pattern`, in enumeration order.
    fn match_pattern(&self, pattern: &Pattern) -> Result<Vec<Atom>, StorageError>;

    /// Nodes of `kind` labelled exactly `label`, in enumeration order.
    fn find_nodes(&self, kind: AtomKind, label: &str) -> Result<Vec<Atom>, StorageError>;

    /// Overwrite an atom's truth value.
    fn set_truth(&self, id: AtomId, tv: TruthValue) -> Result<(), StorageError> {
        self.get(id)?.ok_or(StorageError::AtomNotFound(id))?.set_truth(tv);
        Ok(())
    }

    /// Overwrite an atom's attention value.
    fn set_attention(&self, id: AtomId, av: AttentionValue) -> Result<(), StorageError> {
        self.get(id)?
            .ok_or(StorageError::AtomNotFound(id))?
            .set_attention(av);
        Ok(())
    }

    /// Merge `tv` into an atom's truth value with the revision formula.
    /// The read-modify-write is atomic for that atom.
    fn revise_truth(&self, id: AtomId, tv: TruthValue) -> Result<TruthValue, StorageError> {
        let atom = self.get(id)?.ok_or(StorageError::AtomNotFound(id))?;
        Ok(atom.update_truth(|current| crate::truth::revision(current, tv)))
    }

    /// Add `delta` to an atom's short-term importance; returns the new value.
    fn add_sti(&self, id: AtomId, delta: i32) -> Result<i32, StorageError> {
        Ok(self
            .get(id)?
            .ok_or(StorageError::AtomNotFound(id))?
            .add_sti(delta))
    }

    /// Resolve each outgoing id of `atom`; deleted targets come back as `None`.
    fn resolve_outgoing(&self, atom: &Atom) -> Result<Vec<Option<Atom>>, StorageError> {
        atom.outgoing().iter().map(|id| self.get(*id)).collect()
    }
}

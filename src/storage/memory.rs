//! In-memory storage backend.
//!
//! [`AtomSpace`] is a thread-safe, in-memory [`AtomStore`]. One lock guards
//! structure (the atom map, the id counter and the secondary indexes); atom
//! values live in per-atom cells and are updated outside that lock.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::{Read, Write};
use std::path::Path;
use std::sync::RwLock;

use uuid::Uuid;

use crate::atom::{Atom, AtomId, AtomKind, AtomShape};
use crate::pattern::Pattern;
use crate::storage::snapshot::{self, ImportReport, SnapshotError, SnapshotHeader};
use crate::storage::traits::{AtomStore, StorageError};

fn lock_err(context: &'static str) -> StorageError {
    StorageError::BackendError(format!("poisoned lock: {context}"))
}

#[derive(Debug)]
struct SpaceState {
    // Keyed by id; ids are handed out in increasing order so iteration
    // order is creation order.
    atoms: BTreeMap<AtomId, Atom>,
    by_node: HashMap<(AtomKind, String), BTreeSet<AtomId>>,
    incoming: HashMap<AtomId, BTreeSet<AtomId>>,
    next_id: u64,
}

impl Default for SpaceState {
    fn default() -> Self {
        Self {
            atoms: BTreeMap::new(),
            by_node: HashMap::new(),
            incoming: HashMap::new(),
            next_id: 1,
        }
    }
}

impl SpaceState {
    fn allocate_id(&mut self) -> Result<AtomId, StorageError> {
        let id = self.next_id;
        self.next_id = id.checked_add(1).ok_or(StorageError::ResourceExhausted {
            limit: usize::MAX,
        })?;
        Ok(AtomId::from_raw(id))
    }

    fn index_insert(&mut self, atom: &Atom) {
        match atom.shape() {
            AtomShape::Node { label: Some(label) } => {
                self.by_node
                    .entry((atom.kind(), label.clone()))
                    .or_default()
                    .insert(atom.id());
            }
            AtomShape::Node { label: None } => {}
            AtomShape::Link { outgoing } => {
                for target in outgoing {
                    self.incoming.entry(*target).or_default().insert(atom.id());
                }
            }
        }
    }

    fn index_remove(&mut self, atom: &Atom) {
        match atom.shape() {
            AtomShape::Node { label: Some(label) } => {
                let key = (atom.kind(), label.clone());
                if let Some(set) = self.by_node.get_mut(&key) {
                    set.remove(&atom.id());
                    if set.is_empty() {
                        self.by_node.remove(&key);
                    }
                }
            }
            AtomShape::Node { label: None } => {}
            AtomShape::Link { outgoing } => {
                for target in outgoing {
                    if let Some(set) = self.incoming.get_mut(target) {
                        set.remove(&atom.id());
                        if set.is_empty() {
                            self.incoming.remove(target);
                        }
                    }
                }
            }
        }
        self.incoming.remove(&atom.id());
    }

    fn resolve(&self, id: AtomId) -> Option<Atom> {
        self.atoms.get(&id).cloned()
    }
}

/// Thread-safe in-memory hypergraph store.
#[derive(Debug)]
pub struct AtomSpace {
    space_id: Uuid,
    max_atoms: Option<usize>,
    state: RwLock<SpaceState>,
}

impl Default for AtomSpace {
    fn default() -> Self {
        Self::new()
    }
}

impl AtomSpace {
    /// Create a new, unbounded store.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity_limit(None)
    }

    /// Create a store that refuses to hold more than `max_atoms` atoms.
    #[must_use]
    pub fn with_capacity_limit(max_atoms: Option<usize>) -> Self {
        let space = Self {
            space_id: Uuid::new_v4(),
            max_atoms,
            state: RwLock::new(SpaceState::default()),
        };
        tracing::debug!(space = %space.space_id, ?max_atoms, "atomspace created");
        space
    }

    /// Create a store from configuration.
    #[must_use]
    pub fn from_config(config: &crate::config::SpaceConfig) -> Self {
        Self::with_capacity_limit(config.max_atoms)
    }

    /// Identity of this store instance, stable for its lifetime.
    #[must_use]
    pub fn space_id(&self) -> Uuid {
        self.space_id
    }

    /// Capacity limit, if any.
    #[must_use]
    pub fn max_atoms(&self) -> Option<usize> {
        self.max_atoms
    }

    /// Write a snapshot of this store to `writer`.
    ///
    /// # Errors
    ///
    /// See [`snapshot::export_snapshot`].
    pub fn export_snapshot(&self, writer: &mut impl Write) -> Result<SnapshotHeader, SnapshotError> {
        snapshot::export_snapshot(self, self.space_id, writer)
    }

    /// Atomically write a snapshot file at `path`.
    ///
    /// # Errors
    ///
    /// See [`snapshot::export_to_path`].
    pub fn export_to_path(&self, path: impl AsRef<Path>) -> Result<SnapshotHeader, SnapshotError> {
        snapshot::export_to_path(self, self.space_id, path.as_ref())
    }

    /// Recreate the atoms of a snapshot in this store under fresh ids.
    ///
    /// # Errors
    ///
    /// See [`snapshot::import_snapshot`].
    pub fn import_snapshot(&self, reader: &mut impl Read) -> Result<ImportReport, SnapshotError> {
        snapshot::import_snapshot(self, reader)
    }

    /// Import a snapshot file.
    ///
    /// # Errors
    ///
    /// See [`snapshot::import_from_path`].
    pub fn import_from_path(&self, path: impl AsRef<Path>) -> Result<ImportReport, SnapshotError> {
        snapshot::import_from_path(self, path.as_ref())
    }

    fn insert(&self, kind: AtomKind, shape: AtomShape) -> Result<Atom, StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("atom.insert"))?;
        if let Some(limit) = self.max_atoms {
            if state.atoms.len() >= limit {
                tracing::warn!(space = %self.space_id, limit, "atomspace capacity exhausted");
                return Err(StorageError::ResourceExhausted { limit });
            }
        }

        let id = state.allocate_id()?;
        let atom = Atom::new(id, kind, shape);
        state.index_insert(&atom);
        state.atoms.insert(id, atom.clone());
        Ok(atom)
    }
}

impl AtomStore for AtomSpace {
    fn create_node(&self, kind: AtomKind, label: Option<&str>) -> Result<Atom, StorageError> {
        self.insert(kind, AtomShape::Node {
            label: label.map(str::to_string),
        })
    }

    fn create_link(&self, kind: AtomKind, outgoing: Vec<AtomId>) -> Result<Atom, StorageError> {
        self.insert(kind, AtomShape::Link { outgoing })
    }

    fn get(&self, id: AtomId) -> Result<Option<Atom>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("atom.get"))?;
        Ok(state.resolve(id))
    }

    fn delete(&self, id: AtomId) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("atom.delete"))?;
        let atom = state.atoms.remove(&id).ok_or(StorageError::AtomNotFound(id))?;
        state.index_remove(&atom);
        tracing::debug!(space = %self.space_id, atom = %id, kind = %atom.kind(), "atom deleted");
        Ok(())
    }

    fn reserve_id(&self) -> Result<AtomId, StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("atom.reserve_id"))?;
        state.allocate_id()
    }

    fn atoms(&self) -> Result<Vec<Atom>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("atom.atoms"))?;
        Ok(state.atoms.values().cloned().collect())
    }

    fn len(&self) -> Result<usize, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("atom.len"))?;
        Ok(state.atoms.len())
    }

    fn query(&self, predicate: &dyn Fn(&Atom) -> bool) -> Result<Vec<Atom>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("atom.query"))?;
        Ok(state
            .atoms
            .values()
            .filter(|a| predicate(a))
            .cloned()
            .collect())
    }

    fn incoming(&self, id: AtomId) -> Result<Vec<Atom>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("atom.incoming"))?;
        let Some(links) = state.incoming.get(&id) else {
            return Ok(Vec::new());
        };
        Ok(links.iter().filter_map(|l| state.resolve(*l)).collect())
    }

    fn match_pattern(&self, pattern: &Pattern) -> Result<Vec<Atom>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("atom.match_pattern"))?;
        let resolve = |id: AtomId| state.resolve(id);
        Ok(state
            .atoms
            .values()
            .filter(|a| pattern.matches(a, &resolve))
            .cloned()
            .collect())
    }

    fn find_nodes(&self, kind: AtomKind, label: &str) -> Result<Vec<Atom>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("atom.find_nodes"))?;
        let Some(ids) = state.by_node.get(&(kind, label.to_string())) else {
            return Ok(Vec::new());
        };
        Ok(ids.iter().filter_map(|id| state.resolve(*id)).collect())
    }
}

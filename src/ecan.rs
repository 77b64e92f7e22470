//! Economic attention allocation.
//!
//! The allocator ranks a store's atoms by short-term importance and keeps
//! the top `focus_size` of them as the attentional focus. The focus is
//! recomputed on demand by [`AttentionAllocator::update`] and holds ids, so
//! atoms deleted since the last update drop out when it is read.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::atom::{Atom, AtomId};
use crate::attention::{spread_importance, AttentionValue, SpreadMode, SpreadOutcome};
use crate::config::EcanConfig;
use crate::storage::{AtomStore, StorageError};

/// Declared budgets next to what the store currently holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttentionBudget {
    /// Declared STI budget.
    pub total_sti: i64,
    /// Declared LTI budget.
    pub total_lti: i64,
    /// Sum of STI over all atoms.
    pub allocated_sti: i64,
    /// Sum of LTI over all atoms.
    pub allocated_lti: i64,
}

impl AttentionBudget {
    /// True when the store holds more STI than declared.
    #[must_use]
    pub fn sti_overdrawn(&self) -> bool {
        self.allocated_sti > self.total_sti
    }
}

/// Attention allocator bound to one store.
pub struct AttentionAllocator {
    store: Arc<dyn AtomStore>,
    total_sti: i64,
    total_lti: i64,
    focus_size: usize,
    spread_mode: SpreadMode,
    focus: RwLock<Vec<AtomId>>,
}

impl std::fmt::Debug for AttentionAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttentionAllocator")
            .field("total_sti", &self.total_sti)
            .field("total_lti", &self.total_lti)
            .field("focus_size", &self.focus_size)
            .field("spread_mode", &self.spread_mode)
            .field("focus", &*self.focus.read())
            .finish_non_exhaustive()
    }
}

impl AttentionAllocator {
    /// Creates an allocator with default settings.
    #[must_use]
    pub fn new(store: Arc<dyn AtomStore>) -> Self {
        Self::from_config(store, &EcanConfig::default())
    }

    /// Creates an allocator from `ecan` settings.
    #[must_use]
    pub fn from_config(store: Arc<dyn AtomStore>, config: &EcanConfig) -> Self {
        Self {
            store,
            total_sti: config.total_sti,
            total_lti: config.total_lti,
            focus_size: config.focus_size,
            spread_mode: config.spread_mode,
            focus: RwLock::new(Vec::new()),
        }
    }

    /// Maximum focus length.
    #[must_use]
    pub fn focus_size(&self) -> usize {
        self.focus_size
    }

    /// Spreading mode used by [`Self::spread`].
    #[must_use]
    pub fn spread_mode(&self) -> SpreadMode {
        self.spread_mode
    }

    /// Adds `delta` to an atom's STI without clamping, then recomputes the
    /// focus. Returns the atom's new STI.
    ///
    /// # Errors
    ///
    /// `AtomNotFound` if the atom does not exist.
    pub fn allocate(&self, id: AtomId, delta: i32) -> Result<i32, StorageError> {
        let sti = self.store.add_sti(id, delta)?;
        self.update()?;
        Ok(sti)
    }

    /// Recomputes the focus: every atom sorted by STI descending, atoms with
    /// equal STI kept in enumeration order, truncated to `focus_size`.
    ///
    /// # Errors
    ///
    /// Propagates store failures; the previous focus is kept.
    pub fn update(&self) -> Result<(), StorageError> {
        let mut ranked: Vec<(i32, AtomId)> = self
            .store
            .atoms()?
            .iter()
            .map(|a| (a.sti(), a.id()))
            .collect();
        // Stable sort keeps enumeration order among ties.
        ranked.sort_by(|x, y| y.0.cmp(&x.0));
        ranked.truncate(self.focus_size);

        let mut focus = self.focus.write();
        *focus = ranked.into_iter().map(|(_, id)| id).collect();
        tracing::debug!(focus = focus.len(), limit = self.focus_size, "attentional focus updated");
        Ok(())
    }

    /// Spreads STI from `source` to the links that reference it. Does not
    /// update the focus.
    ///
    /// # Errors
    ///
    /// `AtomNotFound` if `source` does not exist.
    pub fn spread(&self, source: AtomId) -> Result<SpreadOutcome, StorageError> {
        spread_importance(self.store.as_ref(), source, self.spread_mode)
    }

    /// Multiplies every atom's STI by `1 - rate`, truncating toward zero,
    /// then updates the focus.
    ///
    /// Rates outside `[0, 1]` are clamped; NaN is treated as 0.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn decay(&self, rate: f64) -> Result<(), StorageError> {
        let clamped = if rate.is_nan() { 0.0 } else { rate.clamp(0.0, 1.0) };
        if clamped.to_bits() != rate.to_bits() {
            tracing::warn!(rate, clamped, "decay rate outside [0, 1]");
        }
        let keep = 1.0 - clamped;

        for atom in self.store.atoms()? {
            atom.update_attention(|av| AttentionValue {
                sti: scale(av.sti, keep),
                ..av
            });
        }
        self.update()
    }

    /// Current focus, highest STI first. Empty until the first
    /// [`Self::update`].
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn focus(&self) -> Result<Vec<Atom>, StorageError> {
        let ids = self.focus.read().clone();
        let mut atoms = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(atom) = self.store.get(id)? {
                atoms.push(atom);
            }
        }
        Ok(atoms)
    }

    /// True if `id` was in the focus at the last update.
    #[must_use]
    pub fn in_focus(&self, id: AtomId) -> bool {
        self.focus.read().contains(&id)
    }

    /// Declared budgets and current totals. Never enforced.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn budget(&self) -> Result<AttentionBudget, StorageError> {
        let (allocated_sti, allocated_lti) = self
            .store
            .atoms()?
            .iter()
            .map(Atom::attention)
            .fold((0_i64, 0_i64), |(s, l), av| {
                (s + i64::from(av.sti), l + i64::from(av.lti))
            });
        Ok(AttentionBudget {
            total_sti: self.total_sti,
            total_lti: self.total_lti,
            allocated_sti,
            allocated_lti,
        })
    }
}

#[allow(clippy::cast_possible_truncation)]
fn scale(sti: i32, factor: f64) -> i32 {
    // |sti * factor| <= |sti| for factor in [0, 1], so the cast cannot overflow.
    (f64::from(sti) * factor).trunc() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::atom::AtomKind;
    use crate::storage::AtomSpace;

    fn allocator_with(stis: &[i32]) -> (AttentionAllocator, Vec<AtomId>) {
        let store: Arc<dyn AtomStore> = Arc::new(AtomSpace::new());
        let ids = stis
            .iter()
            .enumerate()
            .map(|(i, sti)| {
                let atom = store.create_node(AtomKind::Concept, Some(&format!("a{i}"))).unwrap();
                atom.add_sti(*sti);
                atom.id()
            })
            .collect();
        (AttentionAllocator::new(store), ids)
    }

    fn focus_ids(ecan: &AttentionAllocator) -> Vec<AtomId> {
        ecan.focus().unwrap().iter().map(Atom::id).collect()
    }

    #[test]
    fn focus_is_empty_before_update() {
        let (ecan, _) = allocator_with(&[5, 6]);
        assert!(ecan.focus().unwrap().is_empty());
    }

    #[test]
    fn allocate_orders_focus_by_sti() {
        let (ecan, ids) = allocator_with(&[0, 0, 0]);
        ecan.allocate(ids[0], 50).unwrap();
        ecan.allocate(ids[1], 100).unwrap();
        ecan.allocate(ids[2], 75).unwrap();
        ecan.update().unwrap();

        let stis: Vec<i32> = ecan.focus().unwrap().iter().map(Atom::sti).collect();
        assert_eq!(stis, vec![100, 75, 50]);
    }

    #[test]
    fn ties_keep_enumeration_order_and_size_is_bounded() {
        let store: Arc<dyn AtomStore> = Arc::new(AtomSpace::new());
        let ids: Vec<AtomId> = (0..30)
            .map(|i| store.create_node(AtomKind::Concept, Some(&format!("n{i}"))).unwrap().id())
            .collect();
        let ecan = AttentionAllocator::new(store);
        ecan.update().unwrap();
        assert_eq!(focus_ids(&ecan), ids[..20].to_vec());
    }

    #[test]
    fn decay_truncates() {
        let (ecan, ids) = allocator_with(&[100, -15, 7]);
        ecan.decay(0.1).unwrap();
        let stis: Vec<i32> = ids.iter().map(|id| ecan.store.get(*id).unwrap().unwrap().sti()).collect();
        assert_eq!(stis, vec![90, -13, 6]);

        ecan.decay(0.0).unwrap();
        assert_eq!(ecan.store.get(ids[0]).unwrap().unwrap().sti(), 90);

        ecan.decay(1.0).unwrap();
        assert!(ecan.focus().unwrap().iter().all(|a| a.sti() == 0));
    }

    #[test]
    fn decay_clamps_out_of_range_rates() {
        let (ecan, ids) = allocator_with(&[40]);
        ecan.decay(-3.0).unwrap();
        assert_eq!(ecan.store.get(ids[0]).unwrap().unwrap().sti(), 40);
        ecan.decay(7.5).unwrap();
        assert_eq!(ecan.store.get(ids[0]).unwrap().unwrap().sti(), 0);
    }

    #[test]
    fn spread_does_not_refresh_focus() {
        let store: Arc<dyn AtomStore> = Arc::new(AtomSpace::new());
        let hub = store.create_node(AtomKind::Concept, Some("hub")).unwrap();
        let leaf = store.create_node(AtomKind::Concept, Some("leaf")).unwrap();
        let link = store.create_link(AtomKind::Inheritance, vec![leaf.id(), hub.id()]).unwrap();
        let ecan = AttentionAllocator::from_config(store, &EcanConfig {
            focus_size: 1,
            ..EcanConfig::default()
        });

        ecan.allocate(hub.id(), 10).unwrap();
        assert_eq!(focus_ids(&ecan), vec![hub.id()]);

        ecan.spread(hub.id()).unwrap();
        assert_eq!(link.sti(), 5);
        assert!(!ecan.in_focus(link.id()));
    }

    #[test]
    fn deleted_atoms_leave_the_focus() {
        let (ecan, ids) = allocator_with(&[3, 2, 1]);
        ecan.update().unwrap();
        ecan.store.delete(ids[0]).unwrap();
        assert_eq!(focus_ids(&ecan), vec![ids[1], ids[2]]);
    }

    #[test]
    fn budget_is_informational() {
        let store: Arc<dyn AtomStore> = Arc::new(AtomSpace::new());
        let a = store.create_node(AtomKind::Concept, Some("a")).unwrap();
        a.set_attention(AttentionValue::new(80, 5, 0));
        let ecan = AttentionAllocator::from_config(store, &EcanConfig {
            total_sti: 50,
            total_lti: 10,
            ..EcanConfig::default()
        });

        ecan.allocate(a.id(), 20).unwrap();
        let budget = ecan.budget().unwrap();
        assert_eq!(budget.allocated_sti, 100);
        assert_eq!(budget.allocated_lti, 5);
        assert!(budget.sti_overdrawn());
    }

    #[test]
    fn allocate_unknown_atom_is_not_found() {
        let (ecan, _) = allocator_with(&[]);
        let err = ecan.allocate(AtomId::from_raw(9), 1).unwrap_err();
        assert!(matches!(err, StorageError::AtomNotFound(_)));
    }
}

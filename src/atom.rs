//! Atoms: the nodes and links of the hypergraph.
//!
//! An [`Atom`] is a cheap, clonable handle onto storage owned by an
//! [`AtomSpace`](crate::storage::AtomSpace). The immutable parts (id, kind,
//! label or outgoing set) are read without locking; truth and attention sit
//! in per-atom cells so concurrent updates to unrelated atoms never contend.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::attention::AttentionValue;
use crate::truth::TruthValue;

/// Unique identifier for an atom within one store.
///
/// Ids are assigned in strictly increasing order and never reused, so an id
/// whose atom has been deleted can never resolve to a different atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AtomId(u64);

impl AtomId {
    /// Wraps a raw id.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw id.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AtomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Closed set of atom kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AtomKind {
    /// Untyped node.
    Node,
    /// Untyped link.
    Link,
    /// A concept, e.g. "cat".
    Concept,
    /// A predicate, e.g. "likes".
    Predicate,
    /// Applies a predicate to a list of arguments.
    Evaluation,
    /// `outgoing[0]` is a subtype of `outgoing[1]`.
    Inheritance,
    /// Symmetric similarity.
    Similarity,
    /// `outgoing[0]` implies `outgoing[1]`.
    Implication,
    /// Records the output of an executed schema.
    Execution,
    /// Ordered argument list.
    List,
}

impl AtomKind {
    /// All kinds, in declaration order.
    pub const ALL: [Self; 10] = [
        Self::Node,
        Self::Link,
        Self::Concept,
        Self::Predicate,
        Self::Evaluation,
        Self::Inheritance,
        Self::Similarity,
        Self::Implication,
        Self::Execution,
        Self::List,
    ];

    /// Returns true for the kinds conventionally used for nodes.
    #[must_use]
    pub const fn is_node_kind(self) -> bool {
        matches!(self, Self::Node | Self::Concept | Self::Predicate)
    }

    /// Returns true for the kinds conventionally used for links.
    #[must_use]
    pub const fn is_link_kind(self) -> bool {
        !self.is_node_kind()
    }

    /// Link kinds that forward and backward chaining walk along.
    #[must_use]
    pub const fn is_chainable(self) -> bool {
        matches!(self, Self::Inheritance | Self::Implication)
    }

    /// Stable name used by the snapshot format.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Node => "Node",
            Self::Link => "Link",
            Self::Concept => "ConceptNode",
            Self::Predicate => "PredicateNode",
            Self::Evaluation => "EvaluationLink",
            Self::Inheritance => "InheritanceLink",
            Self::Similarity => "SimilarityLink",
            Self::Implication => "ImplicationLink",
            Self::Execution => "ExecutionLink",
            Self::List => "ListLink",
        }
    }
}

impl fmt::Display for AtomKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown kind name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown atom kind: {0}")]
pub struct UnknownKind(pub String);

impl FromStr for AtomKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

/// Structural payload of an atom: a label for nodes, an outgoing set for links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum AtomShape {
    /// A node, optionally labelled.
    Node {
        /// Node label; may be absent or empty.
        label: Option<String>,
    },
    /// A link over other atoms. Order is significant; may be empty.
    Link {
        /// Referenced atoms. Entries may dangle once their target is deleted.
        outgoing: Vec<AtomId>,
    },
}

#[derive(Debug)]
struct AtomCell {
    id: AtomId,
    kind: AtomKind,
    shape: AtomShape,
    truth: Mutex<TruthValue>,
    attention: Mutex<AttentionValue>,
}

/// Handle onto an atom stored in an `AtomSpace`.
///
/// Cloning is cheap. Handles compare equal when they refer to the same atom.
#[derive(Debug, Clone)]
pub struct Atom {
    cell: Arc<AtomCell>,
}

impl Atom {
    pub(crate) fn new(id: AtomId, kind: AtomKind, shape: AtomShape) -> Self {
        Self {
            cell: Arc::new(AtomCell {
                id,
                kind,
                shape,
                truth: Mutex::new(TruthValue::default()),
                attention: Mutex::new(AttentionValue::default()),
            }),
        }
    }

    /// Returns the atom id.
    #[must_use]
    pub fn id(&self) -> AtomId {
        self.cell.id
    }

    /// Returns the atom kind.
    #[must_use]
    pub fn kind(&self) -> AtomKind {
        self.cell.kind
    }

    /// Returns the structural payload.
    #[must_use]
    pub fn shape(&self) -> &AtomShape {
        &self.cell.shape
    }

    /// True when the atom was created as a node.
    #[must_use]
    pub fn is_node(&self) -> bool {
        matches!(self.cell.shape, AtomShape::Node { .. })
    }

    /// True when the atom was created as a link.
    #[must_use]
    pub fn is_link(&self) -> bool {
        !self.is_node()
    }

    /// Node label, `None` for links and unlabelled nodes.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        match &self.cell.shape {
            AtomShape::Node { label } => label.as_deref(),
            AtomShape::Link { .. } => None,
        }
    }

    /// Outgoing set; empty for nodes.
    #[must_use]
    pub fn outgoing(&self) -> &[AtomId] {
        match &self.cell.shape {
            AtomShape::Node { .. } => &[],
            AtomShape::Link { outgoing } => outgoing,
        }
    }

    /// Number of outgoing references.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.outgoing().len()
    }

    /// True if `id` appears in the outgoing set.
    #[must_use]
    pub fn references(&self, id: AtomId) -> bool {
        self.outgoing().contains(&id)
    }

    /// Current truth value.
    #[must_use]
    pub fn truth(&self) -> TruthValue {
        *self.cell.truth.lock()
    }

    /// Overwrites the truth value. Values are stored as given.
    pub fn set_truth(&self, tv: TruthValue) {
        *self.cell.truth.lock() = tv;
    }

    /// Atomically replaces the truth value with `f(current)` and returns the result.
    pub fn update_truth(&self, f: impl FnOnce(TruthValue) -> TruthValue) -> TruthValue {
        let mut guard = self.cell.truth.lock();
        *guard = f(*guard);
        *guard
    }

    /// Current attention value.
    #[must_use]
    pub fn attention(&self) -> AttentionValue {
        *self.cell.attention.lock()
    }

    /// Overwrites the attention value. No clamping is applied.
    pub fn set_attention(&self, av: AttentionValue) {
        *self.cell.attention.lock() = av;
    }

    /// Short-term importance.
    #[must_use]
    pub fn sti(&self) -> i32 {
        self.cell.attention.lock().sti
    }

    /// Adds `delta` to the short-term importance and returns the new value.
    pub fn add_sti(&self, delta: i32) -> i32 {
        let mut guard = self.cell.attention.lock();
        guard.sti = guard.sti.saturating_add(delta);
        guard.sti
    }

    /// Atomically replaces the attention value with `f(current)` and returns the result.
    pub fn update_attention(
        &self,
        f: impl FnOnce(AttentionValue) -> AttentionValue,
    ) -> AttentionValue {
        let mut guard = self.cell.attention.lock();
        *guard = f(*guard);
        *guard
    }
}

impl PartialEq for Atom {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }
}

impl Eq for Atom {}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cell.shape {
            AtomShape::Node { label } => {
                write!(f, "{}#{}({})", self.cell.kind, self.cell.id, label.as_deref().unwrap_or(""))
            }
            AtomShape::Link { outgoing } => {
                write!(f, "{}#{}[", self.cell.kind, self.cell.id)?;
                for (i, id) in outgoing.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{id}")?;
                }
                f.write_str("]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_roundtrip_through_from_str() {
        for kind in AtomKind::ALL {
            assert_eq!(kind.name().parse::<AtomKind>().unwrap(), kind);
        }
        assert!("BogusLink".parse::<AtomKind>().is_err());
    }

    #[test]
    fn node_and_link_accessors() {
        let node = Atom::new(AtomId::from_raw(1), AtomKind::Concept, AtomShape::Node {
            label: Some("cat".to_string()),
        });
        assert!(node.is_node());
        assert_eq!(node.label(), Some("cat"));
        assert!(node.outgoing().is_empty());

        let link = Atom::new(AtomId::from_raw(2), AtomKind::Inheritance, AtomShape::Link {
            outgoing: vec![AtomId::from_raw(1), AtomId::from_raw(7)],
        });
        assert!(link.is_link());
        assert_eq!(link.label(), None);
        assert_eq!(link.arity(), 2);
        assert!(link.references(AtomId::from_raw(7)));
        assert_eq!(link.to_string(), "InheritanceLink#2[1, 7]");
    }

    #[test]
    fn defaults_and_setters_do_not_clamp() {
        let atom = Atom::new(AtomId::from_raw(3), AtomKind::Node, AtomShape::Node { label: None });
        assert_eq!(atom.truth(), TruthValue::default());
        assert_eq!(atom.attention(), AttentionValue::default());

        atom.set_truth(TruthValue::new(1.5, -0.2, 3));
        assert!((atom.truth().strength - 1.5).abs() < f32::EPSILON);
        assert!((atom.truth().confidence + 0.2).abs() < f32::EPSILON);

        assert_eq!(atom.add_sti(-40), -40);
        assert_eq!(atom.add_sti(50), 10);
    }

    #[test]
    fn clones_share_value_cells() {
        let atom = Atom::new(AtomId::from_raw(4), AtomKind::Concept, AtomShape::Node { label: None });
        let other = atom.clone();
        other.add_sti(5);
        assert_eq!(atom.sti(), 5);
        assert_eq!(atom, other);
    }
}

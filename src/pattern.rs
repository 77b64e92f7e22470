//! Structural patterns over atoms.
//!
//! Matching is plain tree matching: a pattern fixes (optionally) a kind, a
//! label and the exact shape of the outgoing set, with wildcards standing in
//! for any subtree. There are no variables and nothing is bound across
//! sibling subpatterns.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::atom::{Atom, AtomId, AtomKind};

/// A pattern node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern {
    /// Required kind; `None` accepts any kind.
    pub kind: Option<AtomKind>,
    /// Required label; `None` accepts any label (or none).
    pub label: Option<String>,
    /// Child patterns matched position-by-position against the outgoing set.
    pub children: Vec<Pattern>,
    /// Matches any atom, ignoring every other field.
    pub wildcard: bool,
}

impl Pattern {
    /// Pattern matching every atom.
    #[must_use]
    pub fn any() -> Self {
        Self {
            wildcard: true,
            ..Self::default()
        }
    }

    /// Pattern matching any atom of `kind` with an empty outgoing set.
    ///
    /// Nodes always have an empty outgoing set, so for node kinds this
    /// matches every node of that kind regardless of label.
    #[must_use]
    pub fn of_kind(kind: AtomKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    /// Pattern matching a node of `kind` labelled exactly `label`.
    #[must_use]
    pub fn node(kind: AtomKind, label: impl Into<String>) -> Self {
        Self {
            kind: Some(kind),
            label: Some(label.into()),
            ..Self::default()
        }
    }

    /// Pattern matching a link of `kind` whose outgoing atoms match `children`.
    #[must_use]
    pub fn link(kind: AtomKind, children: Vec<Pattern>) -> Self {
        Self {
            kind: Some(kind),
            children,
            ..Self::default()
        }
    }

    /// Replaces the label constraint.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Tests `atom` against this pattern.
    ///
    /// `resolve` maps outgoing ids to atoms. An outgoing id that no longer
    /// resolves simply fails to match.
    pub fn matches<F>(&self, atom: &Atom, resolve: &F) -> bool
    where
        F: Fn(AtomId) -> Option<Atom>,
    {
        if self.wildcard {
            return true;
        }
        if self.kind.is_some_and(|k| k != atom.kind()) {
            return false;
        }
        if let Some(label) = &self.label {
            if atom.label() != Some(label.as_str()) {
                return false;
            }
        }

        let outgoing = atom.outgoing();
        if self.children.len() != outgoing.len() {
            return false;
        }

        self.children
            .iter()
            .zip(outgoing)
            .all(|(child, id)| resolve(*id).is_some_and(|a| child.matches(&a, resolve)))
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.wildcard {
            return f.write_str("*");
        }
        match self.kind {
            Some(kind) => write!(f, "{kind}")?,
            None => f.write_str("?")?,
        }
        if let Some(label) = &self.label {
            write!(f, "({label})")?;
        }
        if !self.children.is_empty() {
            f.write_str("[")?;
            for (i, child) in self.children.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{child}")?;
            }
            f.write_str("]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    use crate::atom::AtomShape;

    fn node(id: u64, kind: AtomKind, label: &str) -> Atom {
        Atom::new(AtomId::from_raw(id), kind, AtomShape::Node {
            label: Some(label.to_string()),
        })
    }

    fn link(id: u64, kind: AtomKind, outgoing: &[u64]) -> Atom {
        Atom::new(AtomId::from_raw(id), kind, AtomShape::Link {
            outgoing: outgoing.iter().copied().map(AtomId::from_raw).collect(),
        })
    }

    fn universe() -> HashMap<AtomId, Atom> {
        [
            node(1, AtomKind::Concept, "cat"),
            node(2, AtomKind::Concept, "animal"),
            node(3, AtomKind::Predicate, "likes"),
            link(4, AtomKind::Inheritance, &[1, 2]),
            link(5, AtomKind::Inheritance, &[1, 99]),
        ]
        .into_iter()
        .map(|a| (a.id(), a))
        .collect()
    }

    #[test]
    fn wildcard_matches_everything() {
        let atoms = universe();
        let resolve = |id| atoms.get(&id).cloned();
        assert!(atoms.values().all(|a| Pattern::any().matches(a, &resolve)));
    }

    #[test]
    fn kind_only_ignores_label() {
        let atoms = universe();
        let resolve = |id| atoms.get(&id).cloned();
        let pat = Pattern::of_kind(AtomKind::Concept);
        let mut hits: Vec<u64> = atoms
            .values()
            .filter(|a| pat.matches(a, &resolve))
            .map(|a| a.id().as_u64())
            .collect();
        hits.sort_unstable();
        assert_eq!(hits, vec![1, 2]);
    }

    #[test]
    fn link_pattern_recurses_into_children() {
        let atoms = universe();
        let resolve = |id| atoms.get(&id).cloned();
        let pat = Pattern::link(AtomKind::Inheritance, vec![
            Pattern::node(AtomKind::Concept, "cat"),
            Pattern::any(),
        ]);
        assert!(pat.matches(&atoms[&AtomId::from_raw(4)], &resolve));
        // Dangling child never matches, even against a wildcard.
        assert!(!pat.matches(&atoms[&AtomId::from_raw(5)], &resolve));
    }

    #[test]
    fn arity_mismatch_is_no_match() {
        let atoms = universe();
        let resolve = |id| atoms.get(&id).cloned();
        let pat = Pattern::link(AtomKind::Inheritance, vec![Pattern::any()]);
        assert!(!pat.matches(&atoms[&AtomId::from_raw(4)], &resolve));
    }

    #[test]
    fn label_constraint_requires_equal_label() {
        let atoms = universe();
        let resolve = |id| atoms.get(&id).cloned();
        let pat = Pattern::of_kind(AtomKind::Inheritance).with_label("cat");
        assert!(!pat.matches(&atoms[&AtomId::from_raw(4)], &resolve));
        assert_eq!(
            Pattern::link(AtomKind::Inheritance, vec![Pattern::node(AtomKind::Concept, "cat"), Pattern::any()])
                .to_string(),
            "InheritanceLink[ConceptNode(cat), *]"
        );
    }
}

//! Forward and backward chaining over an atom store.
//!
//! Chaining composes many short store calls. It never holds the store's
//! structural lock across a round, so concurrent writers are visible to the
//! next lookup.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::atom::{Atom, AtomId, AtomKind};
use crate::attention::{spread_importance, AttentionValue, SpreadMode, SpreadOutcome};
use crate::config::CogConfig;
use crate::pln::rule::Rule;
use crate::storage::{AtomStore, StorageError};
use crate::truth::{self, TruthValue};

/// Snapshot of the engine's activity counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlnStats {
    /// Atoms created by any chaining strategy.
    pub inferences: u64,
    /// Forward chaining rounds run.
    pub forward_rounds: u64,
    /// Backward chaining rounds run.
    pub backward_rounds: u64,
    /// Rule applications by the rule-guided chainer.
    pub rule_matches: u64,
    /// Truth values computed for derived atoms.
    pub truth_computations: u64,
}

#[derive(Debug, Default)]
struct Counters {
    inferences: AtomicU64,
    forward_rounds: AtomicU64,
    backward_rounds: AtomicU64,
    rule_matches: AtomicU64,
    truth_computations: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> PlnStats {
        PlnStats {
            inferences: self.inferences.load(Ordering::Relaxed),
            forward_rounds: self.forward_rounds.load(Ordering::Relaxed),
            backward_rounds: self.backward_rounds.load(Ordering::Relaxed),
            rule_matches: self.rule_matches.load(Ordering::Relaxed),
            truth_computations: self.truth_computations.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        for counter in [
            &self.inferences,
            &self.forward_rounds,
            &self.backward_rounds,
            &self.rule_matches,
            &self.truth_computations,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// Two-argument link usable as a chaining step.
fn is_chain_link(atom: &Atom) -> bool {
    atom.kind().is_chainable() && atom.arity() == 2
}

fn endpoints(atom: &Atom) -> (AtomId, AtomId) {
    let out = atom.outgoing();
    (out[0], out[1])
}

/// Probabilistic inference engine bound to one store.
///
/// The rule base lives behind the engine's own lock; everything else is
/// read from and written to the store.
pub struct PlnEngine {
    store: Arc<dyn AtomStore>,
    rules: RwLock<Vec<Arc<Rule>>>,
    counters: Counters,
    spread_mode: SpreadMode,
    max_steps: usize,
}

impl std::fmt::Debug for PlnEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlnEngine")
            .field("rules", &self.rules.read().len())
            .field("stats", &self.counters.snapshot())
            .field("spread_mode", &self.spread_mode)
            .field("max_steps", &self.max_steps)
            .finish_non_exhaustive()
    }
}

impl PlnEngine {
    /// Creates an engine with default settings.
    #[must_use]
    pub fn new(store: Arc<dyn AtomStore>) -> Self {
        Self::from_config(store, &CogConfig::default())
    }

    /// Creates an engine using the `pln` and `ecan.spread_mode` settings.
    #[must_use]
    pub fn from_config(store: Arc<dyn AtomStore>, config: &CogConfig) -> Self {
        Self {
            store,
            rules: RwLock::new(Vec::new()),
            counters: Counters::default(),
            spread_mode: config.ecan.spread_mode,
            max_steps: config.pln.max_steps,
        }
    }

    /// The store this engine reads and writes.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn AtomStore> {
        &self.store
    }

    /// Configured default round limit.
    #[must_use]
    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// Registers a rule; returns its position in the rule base.
    pub fn add_rule(&self, rule: Rule) -> usize {
        let mut rules = self.rules.write();
        tracing::debug!(rule = rule.name(), weight = rule.weight(), "rule registered");
        rules.push(Arc::new(rule));
        rules.len() - 1
    }

    /// Registered rules in registration order.
    #[must_use]
    pub fn rules(&self) -> Vec<Arc<Rule>> {
        self.rules.read().clone()
    }

    /// Number of registered rules.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.read().len()
    }

    /// Deductive forward chaining.
    ///
    /// Each round collects the two-argument inheritance and implication
    /// links and, for every ordered pair `(i, j)` of distinct links with
    /// `i = (a, b)` and `j = (b, c)`, creates `(a, c)` with the kind of `i`
    /// and `deduction(tv(i), tv(j))`. With a target, `i` must be the target or
    /// reference it. Conclusions already present as a link of the same kind
    /// and endpoints are skipped, so repeated rounds converge; the run stops
    /// after `max_steps` rounds or the first round that adds nothing.
    ///
    /// Returns created links in creation order.
    ///
    /// # Errors
    ///
    /// Propagates store failures; links created before the failure remain.
    pub fn forward_chain(
        &self,
        target: Option<AtomId>,
        max_steps: usize,
    ) -> Result<Vec<Atom>, StorageError> {
        let mut results = Vec::new();

        for step in 0..max_steps {
            self.counters.forward_rounds.fetch_add(1, Ordering::Relaxed);

            let candidates = self.store.query(&is_chain_link)?;
            let mut known: HashSet<(AtomKind, AtomId, AtomId)> = candidates
                .iter()
                .map(|l| {
                    let (a, b) = endpoints(l);
                    (l.kind(), a, b)
                })
                .collect();

            // Links by first endpoint, in enumeration order.
            let mut by_head: HashMap<AtomId, Vec<usize>> = HashMap::new();
            for (j, link) in candidates.iter().enumerate() {
                by_head.entry(endpoints(link).0).or_default().push(j);
            }

            let mut added = 0usize;
            for (i, first) in candidates.iter().enumerate() {
                if let Some(t) = target {
                    if first.id() != t && !first.references(t) {
                        continue;
                    }
                }
                let (a, b) = endpoints(first);
                let Some(followers) = by_head.get(&b) else {
                    continue;
                };

                for &j in followers {
                    let second = &candidates[j];
                    if j == i {
                        continue;
                    }
                    let c = endpoints(second).1;
                    if !known.insert((first.kind(), a, c)) {
                        continue;
                    }

                    let tv = truth::deduction(first.truth(), second.truth());
                    let link = self.store.create_link(first.kind(), vec![a, c])?;
                    link.set_truth(tv);
                    self.counters.truth_computations.fetch_add(1, Ordering::Relaxed);
                    self.counters.inferences.fetch_add(1, Ordering::Relaxed);
                    results.push(link);
                    added += 1;
                }
            }

            if added == 0 {
                tracing::debug!(rounds = step + 1, derived = results.len(), "forward chaining converged");
                return Ok(results);
            }
        }

        tracing::debug!(rounds = max_steps, derived = results.len(), "forward chaining hit step limit");
        Ok(results)
    }

    /// Backward chaining from `goal`.
    ///
    /// Only two-argument inheritance and implication links are followed,
    /// the same candidates forward chaining uses; other links pointing at
    /// `goal` are ignored. Round one emits every `a` with such a link
    /// `(a, goal)`; each further round does the same for the premises found
    /// in the previous round. Every atom is emitted at most once, deleted premises are
    /// skipped, and the search stops at `max_steps` rounds or on a round
    /// that finds nothing new.
    ///
    /// # Errors
    ///
    /// `AtomNotFound` if `goal` does not exist; store failures otherwise.
    pub fn backward_chain(&self, goal: AtomId, max_steps: usize) -> Result<Vec<Atom>, StorageError> {
        if !self.store.contains(goal)? {
            return Err(StorageError::AtomNotFound(goal));
        }

        let mut seen: HashSet<AtomId> = HashSet::from([goal]);
        let mut frontier = vec![goal];
        let mut results = Vec::new();

        for _ in 0..max_steps {
            self.counters.backward_rounds.fetch_add(1, Ordering::Relaxed);

            let mut next = Vec::new();
            for conclusion in &frontier {
                for link in self.store.incoming(*conclusion)? {
                    if !is_chain_link(&link) {
                        continue;
                    }
                    let (premise, concluded) = endpoints(&link);
                    if concluded != *conclusion || !seen.insert(premise) {
                        continue;
                    }
                    if let Some(atom) = self.store.get(premise)? {
                        results.push(atom);
                        next.push(premise);
                    }
                }
            }

            if next.is_empty() {
                break;
            }
            frontier = next;
        }

        tracing::debug!(goal = %goal, premises = results.len(), "backward chaining finished");
        Ok(results)
    }

    /// Truth value of an atom.
    ///
    /// # Errors
    ///
    /// `AtomNotFound` if the atom does not exist.
    pub fn evaluate(&self, id: AtomId) -> Result<TruthValue, StorageError> {
        self.store
            .get(id)?
            .map(|a| a.truth())
            .ok_or(StorageError::AtomNotFound(id))
    }

    /// Merges new evidence into an atom's truth value with the revision
    /// formula and returns the result.
    ///
    /// # Errors
    ///
    /// `AtomNotFound` if the atom does not exist.
    pub fn revise(&self, id: AtomId, evidence: TruthValue) -> Result<TruthValue, StorageError> {
        let revised = self.store.revise_truth(id, evidence)?;
        self.counters.truth_computations.fetch_add(1, Ordering::Relaxed);
        Ok(revised)
    }

    /// Adds `delta` to an atom's STI; returns the new value.
    ///
    /// # Errors
    ///
    /// `AtomNotFound` if the atom does not exist.
    pub fn allocate_attention(&self, id: AtomId, delta: i32) -> Result<i32, StorageError> {
        self.store.add_sti(id, delta)
    }

    /// Attention value of an atom.
    ///
    /// # Errors
    ///
    /// `AtomNotFound` if the atom does not exist.
    pub fn attention(&self, id: AtomId) -> Result<AttentionValue, StorageError> {
        self.store
            .get(id)?
            .map(|a| a.attention())
            .ok_or(StorageError::AtomNotFound(id))
    }

    /// Spreads STI from `source` to the links that reference it, using the
    /// configured [`SpreadMode`].
    ///
    /// # Errors
    ///
    /// `AtomNotFound` if `source` does not exist.
    pub fn spread_attention(&self, source: AtomId) -> Result<SpreadOutcome, StorageError> {
        spread_importance(self.store.as_ref(), source, self.spread_mode)
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> PlnStats {
        self.counters.snapshot()
    }

    /// Zeroes every counter.
    pub fn reset_stats(&self) {
        self.counters.reset();
    }

    pub(crate) fn record_rule_match(&self) {
        self.counters.rule_matches.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_inference(&self, computed_truth: bool) {
        self.counters.inferences.fetch_add(1, Ordering::Relaxed);
        if computed_truth {
            self.counters.truth_computations.fetch_add(1, Ordering::Relaxed);
        }
    }
}

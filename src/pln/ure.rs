//! Rule-guided chaining.
//!
//! Each round picks the registered rule with the highest
//! `weight / (1 + complexity)` among those whose premises all match, binds
//! the first match of every premise and builds the conclusion. The
//! complexity penalty grows after every applied round, which is what makes
//! a chainer stateful across runs.

use std::sync::Arc;

use crate::atom::{Atom, AtomId};
use crate::config::UreConfig;
use crate::pln::engine::PlnEngine;
use crate::pln::rule::Rule;
use crate::storage::StorageError;
use crate::truth::{self, TruthValue};

/// Stateful rule-guided chainer.
#[derive(Debug)]
pub struct UreChainer {
    engine: Arc<PlnEngine>,
    complexity: f32,
    complexity_step: f32,
    max_iter: usize,
}

impl UreChainer {
    /// Creates a chainer with default settings.
    #[must_use]
    pub fn new(engine: Arc<PlnEngine>) -> Self {
        Self::from_config(engine, &UreConfig::default())
    }

    /// Creates a chainer from `ure` settings.
    #[must_use]
    pub fn from_config(engine: Arc<PlnEngine>, config: &UreConfig) -> Self {
        Self {
            engine,
            complexity: config.initial_complexity,
            complexity_step: config.complexity_step,
            max_iter: config.max_iter,
        }
    }

    /// Current complexity penalty.
    #[must_use]
    pub fn complexity(&self) -> f32 {
        self.complexity
    }

    /// Iteration limit per run.
    #[must_use]
    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    /// Changes the iteration limit.
    pub fn set_max_iter(&mut self, max_iter: usize) {
        self.max_iter = max_iter;
    }

    /// Resets the complexity penalty.
    pub fn set_complexity(&mut self, complexity: f32) {
        self.complexity = complexity;
    }

    /// The engine this chainer drives.
    #[must_use]
    pub fn engine(&self) -> &Arc<PlnEngine> {
        &self.engine
    }

    /// Runs up to `max_iter` rounds and returns every atom created, capped
    /// at `2 * max_iter`.
    ///
    /// - With no rules registered this is forward chaining for `max_iter`
    ///   rounds.
    /// - A round where no rule matches runs one forward chaining round
    ///   toward `target` and ends the run.
    /// - A conclusion equal to `target` (same id, or same kind and shape)
    ///   ends the run before the penalty grows.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn chain(&mut self, target: Option<AtomId>) -> Result<Vec<Atom>, StorageError> {
        let cap = self.max_iter.saturating_mul(2);
        let rules = self.engine.rules();

        if rules.is_empty() {
            let mut results = self.engine.forward_chain(target, self.max_iter)?;
            results.truncate(cap);
            return Ok(results);
        }

        let store = Arc::clone(self.engine.store());
        let goal = match target {
            Some(id) => store.get(id)?,
            None => None,
        };
        let mut results = Vec::new();

        for iter in 0..self.max_iter {
            if results.len() >= cap {
                break;
            }

            let Some((rule, bound)) = self.select(&rules)? else {
                tracing::debug!(iter, "no rule matches, falling back to forward chaining");
                let forward = self.engine.forward_chain(target, 1)?;
                let room = cap - results.len();
                results.extend(forward.into_iter().take(room));
                break;
            };

            let conclusion = self.apply(&rule, &bound)?;
            tracing::debug!(
                iter,
                rule = rule.name(),
                complexity = self.complexity,
                atom = %conclusion.id(),
                "rule applied"
            );
            let reached = goal.as_ref().is_some_and(|g| {
                g.id() == conclusion.id()
                    || (g.kind() == conclusion.kind() && g.shape() == conclusion.shape())
            });
            results.push(conclusion);
            if reached {
                break;
            }

            self.complexity += self.complexity_step;
        }

        Ok(results)
    }

    /// Highest-priority rule whose premises all match, with its bindings.
    /// Earlier rules win ties.
    fn select(&self, rules: &[Arc<Rule>]) -> Result<Option<(Arc<Rule>, Vec<Atom>)>, StorageError> {
        let mut best: Option<(f32, Arc<Rule>, Vec<Atom>)> = None;

        for rule in rules {
            let priority = rule.priority(self.complexity);
            if best.as_ref().is_some_and(|(p, _, _)| priority <= *p) {
                continue;
            }
            if let Some(bound) = self.bind(rule)? {
                best = Some((priority, Arc::clone(rule), bound));
            }
        }

        Ok(best.map(|(_, rule, bound)| (rule, bound)))
    }

    /// First match of every premise, or `None` if any premise has none.
    fn bind(&self, rule: &Rule) -> Result<Option<Vec<Atom>>, StorageError> {
        if rule.premises().is_empty() {
            return Ok(None);
        }
        let store = self.engine.store();
        let mut bound = Vec::with_capacity(rule.premises().len());
        for premise in rule.premises() {
            match store.match_pattern(premise)?.into_iter().next() {
                Some(atom) => bound.push(atom),
                None => return Ok(None),
            }
        }
        Ok(Some(bound))
    }

    fn apply(&self, rule: &Rule, bound: &[Atom]) -> Result<Atom, StorageError> {
        let store = self.engine.store();
        let atom = if rule.concludes_link() {
            store.create_link(rule.conclusion_kind(), bound.iter().map(Atom::id).collect())?
        } else {
            store.create_node(rule.conclusion_kind(), rule.conclusion().label.as_deref())?
        };

        let inputs: Vec<TruthValue> = bound.iter().map(Atom::truth).collect();
        let tv = match rule.formula() {
            Some(formula) => Some(formula.compute(&inputs)),
            None if inputs.len() >= 2 => Some(truth::deduction(inputs[0], inputs[1])),
            None => None,
        };
        if let Some(tv) = tv {
            atom.set_truth(tv);
        }

        self.engine.record_rule_match();
        self.engine.record_inference(tv.is_some());
        Ok(atom)
    }
}

//! Truth-value formulas attached to rules.

use std::fmt;
use std::sync::Arc;

use crate::truth::{self, TruthValue};

/// Signature of a user-supplied formula.
pub type FormulaFn = dyn Fn(&[TruthValue]) -> TruthValue + Send + Sync;

/// Combines the truth values of a rule's bound premises into the truth
/// value of its conclusion.
///
/// Binary formulas fold left over their inputs: `[a, b, c]` under
/// `Deduction` is `deduction(deduction(a, b), c)`. A single input passes
/// through unchanged, and an empty input yields [`TruthValue::default`].
#[derive(Clone)]
pub enum Formula {
    /// [`truth::deduction`].
    Deduction,
    /// [`truth::induction`].
    Induction,
    /// [`truth::abduction`].
    Abduction,
    /// [`truth::revision`].
    Revision,
    /// [`truth::and`].
    And,
    /// [`truth::or`].
    Or,
    /// [`truth::not`] of the first input; the rest are ignored.
    Not,
    /// Arbitrary user formula over all inputs, in premise order.
    Custom(Arc<FormulaFn>),
}

impl Formula {
    /// Wraps a closure as a custom formula.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&[TruthValue]) -> TruthValue + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    /// Applies the formula.
    #[must_use]
    pub fn compute(&self, inputs: &[TruthValue]) -> TruthValue {
        let binary: fn(TruthValue, TruthValue) -> TruthValue = match self {
            Self::Custom(f) => return f(inputs),
            Self::Not => {
                return inputs.first().map_or_else(TruthValue::default, |tv| truth::not(*tv));
            }
            Self::Deduction => truth::deduction,
            Self::Induction => truth::induction,
            Self::Abduction => truth::abduction,
            Self::Revision => truth::revision,
            Self::And => truth::and,
            Self::Or => truth::or,
        };

        let Some((first, rest)) = inputs.split_first() else {
            return TruthValue::default();
        };
        rest.iter().fold(*first, |acc, tv| binary(acc, *tv))
    }

    /// Short name, used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Deduction => "deduction",
            Self::Induction => "induction",
            Self::Abduction => "abduction",
            Self::Revision => "revision",
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
            Self::Custom(_) => "custom",
        }
    }
}

impl fmt::Debug for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f32 = 1e-4;

    #[test]
    fn binary_formulas_fold_left() {
        let a = TruthValue::new(0.8, 0.9, 10);
        let b = TruthValue::new(0.7, 0.8, 10);
        let c = TruthValue::new(0.5, 0.5, 1);

        let folded = Formula::Deduction.compute(&[a, b, c]);
        let manual = truth::deduction(truth::deduction(a, b), c);
        assert!(folded.approx_eq(&manual, TOL));
        assert_eq!(folded.count, 21);
    }

    #[test]
    fn single_and_empty_inputs() {
        let a = TruthValue::new(0.3, 0.4, 2);
        assert_eq!(Formula::And.compute(&[a]), a);
        assert_eq!(Formula::Revision.compute(&[]), TruthValue::default());
        assert_eq!(Formula::Not.compute(&[]), TruthValue::default());
    }

    #[test]
    fn not_uses_first_input_only() {
        let a = TruthValue::new(0.25, 0.6, 3);
        let b = TruthValue::new(0.9, 0.9, 9);
        let out = Formula::Not.compute(&[a, b]);
        assert!(out.approx_eq(&TruthValue::new(0.75, 0.6, 3), TOL));
    }

    #[test]
    fn custom_formula_sees_every_input() {
        let max_strength = Formula::custom(|tvs| {
            let s = tvs.iter().map(|tv| tv.strength).fold(0.0_f32, f32::max);
            TruthValue::new(s, 1.0, tvs.len() as u64)
        });
        let out = max_strength.compute(&[
            TruthValue::new(0.2, 0.0, 0),
            TruthValue::new(0.9, 0.0, 0),
            TruthValue::new(0.4, 0.0, 0),
        ]);
        assert!((out.strength - 0.9).abs() < TOL);
        assert_eq!(out.count, 3);
        assert_eq!(format!("{max_strength:?}"), "custom");
    }
}

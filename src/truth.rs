//! Truth values and the PLN truth-value algebra.
//!
//! A truth value is an uncertain-evidence triple: `strength` (probability of
//! truth), `confidence` (how much to trust the strength) and `count` (amount
//! of evidence seen). The combinators here are pure functions over triples
//! and do not touch any store.
//!
//! Ranges are not enforced. Values outside `[0, 1]` pass through every
//! formula unchanged in kind; callers that need clamping must do it
//! themselves.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Denominators smaller than this are treated as zero.
const EPSILON: f32 = 1e-9;

/// Uncertain-evidence triple.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TruthValue {
    /// Probability of truth.
    pub strength: f32,
    /// Confidence in the strength estimate.
    pub confidence: f32,
    /// Evidence count.
    pub count: u64,
}

impl TruthValue {
    /// Creates a truth value as given, without validation.
    #[must_use]
    pub const fn new(strength: f32, confidence: f32, count: u64) -> Self {
        Self {
            strength,
            confidence,
            count,
        }
    }

    /// The value every atom starts with: `(0.5, 0.0, 0)`.
    #[must_use]
    pub const fn unknown() -> Self {
        Self::new(0.5, 0.0, 0)
    }

    /// True if both strength and confidence lie in `[0, 1]`.
    #[must_use]
    pub fn is_normalized(&self) -> bool {
        (0.0..=1.0).contains(&self.strength) && (0.0..=1.0).contains(&self.confidence)
    }

    /// Approximate equality on strength and confidence, exact on count.
    #[must_use]
    pub fn approx_eq(&self, other: &Self, tolerance: f32) -> bool {
        (self.strength - other.strength).abs() <= tolerance
            && (self.confidence - other.confidence).abs() <= tolerance
            && self.count == other.count
    }
}

impl Default for TruthValue {
    fn default() -> Self {
        Self::unknown()
    }
}

impl fmt::Display for TruthValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{:.3}, {:.3}, {}>", self.strength, self.confidence, self.count)
    }
}

/// Deduction: `P(A->C)` from `P(A->B)` and `P(B->C)`.
#[must_use]
pub fn deduction(ab: TruthValue, bc: TruthValue) -> TruthValue {
    TruthValue {
        strength: ab.strength * bc.strength,
        confidence: ab.confidence * bc.confidence,
        count: ab.count.saturating_add(bc.count),
    }
}

/// Induction: `P(B->A)` from `P(A->B)` and `P(B->A)`.
///
/// When both strengths sit at opposite extremes the denominator vanishes;
/// the strength then falls back to `0.5` (indifference).
#[must_use]
pub fn induction(ab: TruthValue, ba: TruthValue) -> TruthValue {
    let agree = ab.strength * ba.strength;
    let denominator = agree + (1.0 - ab.strength) * (1.0 - ba.strength);
    let strength = if denominator.abs() < EPSILON {
        0.5
    } else {
        agree / denominator
    };

    TruthValue {
        strength,
        confidence: ab.confidence * ba.confidence * 0.9,
        count: ab.count,
    }
}

/// Abduction. Deliberately approximate: scaled deduction.
#[must_use]
pub fn abduction(ab: TruthValue, bc: TruthValue) -> TruthValue {
    TruthValue {
        strength: ab.strength * bc.strength * 0.8,
        confidence: ab.confidence * bc.confidence * 0.7,
        count: ab.count.saturating_add(bc.count),
    }
}

/// Revision: merges two independent estimates of the same fact.
///
/// Strength is the confidence-weighted mean. With no confidence on either
/// side the result is the unknown value, counts still summed.
#[must_use]
pub fn revision(a: TruthValue, b: TruthValue) -> TruthValue {
    let total = a.confidence + b.confidence;
    let count = a.count.saturating_add(b.count);

    if total > 0.0 {
        TruthValue {
            strength: (a.strength * a.confidence + b.strength * b.confidence) / total,
            confidence: total / (total + 1.0),
            count,
        }
    } else {
        TruthValue {
            strength: 0.5,
            confidence: 0.0,
            count,
        }
    }
}

/// Conjunction.
#[must_use]
pub fn and(a: TruthValue, b: TruthValue) -> TruthValue {
    TruthValue {
        strength: a.strength * b.strength,
        confidence: a.confidence * b.confidence,
        count: a.count.saturating_add(b.count),
    }
}

/// Disjunction.
#[must_use]
pub fn or(a: TruthValue, b: TruthValue) -> TruthValue {
    TruthValue {
        strength: a.strength + b.strength - a.strength * b.strength,
        confidence: (a.confidence + b.confidence) / 2.0,
        count: a.count.saturating_add(b.count),
    }
}

/// Negation.
#[must_use]
pub fn not(a: TruthValue) -> TruthValue {
    TruthValue {
        strength: 1.0 - a.strength,
        confidence: a.confidence,
        count: a.count,
    }
}

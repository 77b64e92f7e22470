//! Probabilistic logic networks.
//!
//! [`PlnEngine`] runs deductive forward and backward chaining against a
//! store; [`UreChainer`] drives registered [`Rule`]s by priority.

mod engine;
mod formula;
mod rule;
mod ure;

pub use engine::{PlnEngine, PlnStats};
pub use formula::{Formula, FormulaFn};
pub use rule::{Rule, RuleBuilder};
pub use ure::UreChainer;

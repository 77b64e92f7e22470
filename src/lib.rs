//! # cogspace - Hypergraph knowledge store with probabilistic inference
//!
//! cogspace keeps uncertain knowledge in an in-memory hypergraph, derives new
//! knowledge from it with probabilistic logic, and ranks what currently
//! deserves processing with an attention economy.
//!
//! ## Core Concepts
//!
//! - **Atom**: a node or link in the hypergraph, carrying a truth value and an attention value
//! - **AtomSpace**: the thread-safe store that owns every atom
//! - **TruthValue**: a (strength, confidence, count) evidence triple and its algebra
//! - **PlnEngine / UreChainer**: forward, backward and rule-guided chaining
//! - **AttentionAllocator**: STI ranking, spreading, decay and the attentional focus
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use cogspace::{AtomKind, AtomSpace, AtomStore, PlnEngine, TruthValue};
//!
//! let space: Arc<dyn AtomStore> = Arc::new(AtomSpace::new());
//! let cat = space.create_node(AtomKind::Concept, Some("cat"))?;
//! let mammal = space.create_node(AtomKind::Concept, Some("mammal"))?;
//! let animal = space.create_node(AtomKind::Concept, Some("animal"))?;
//! space
//!     .create_link(AtomKind::Inheritance, vec![cat.id(), mammal.id()])?
//!     .set_truth(TruthValue::new(0.95, 0.9, 20));
//! space
//!     .create_link(AtomKind::Inheritance, vec![mammal.id(), animal.id()])?
//!     .set_truth(TruthValue::new(0.99, 0.9, 50));
//!
//! let pln = PlnEngine::new(Arc::clone(&space));
//! let derived = pln.forward_chain(Some(cat.id()), 10)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core types
pub mod atom;
pub mod attention;
pub mod error;
pub mod pattern;
pub mod truth;

// Storage, inference and attention
pub mod config;
pub mod ecan;
pub mod pln;
pub mod storage;

pub use atom::{Atom, AtomId, AtomKind, AtomShape, UnknownKind};
pub use attention::{AttentionValue, SpreadMode, SpreadOutcome};
pub use config::{CogConfig, ConfigError, EcanConfig, PlnConfig, SpaceConfig, UreConfig};
pub use ecan::{AttentionAllocator, AttentionBudget};
pub use error::{CogError, CogResult, ValidationError};
pub use pattern::Pattern;
pub use pln::{Formula, PlnEngine, PlnStats, Rule, RuleBuilder, UreChainer};
pub use storage::{AtomSpace, AtomStore, ImportReport, SnapshotError, SnapshotHeader, StorageError};
pub use truth::TruthValue;

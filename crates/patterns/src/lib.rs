//! Learned correction patterns.
//!
//! A pattern is a first-class rule entity with its own identity, predicate
//! and lifecycle — derived from human corrections, matched against new
//! proposals, strengthened on confirmation and deactivated (never deleted)
//! when it keeps contradicting reality.

pub mod in_memory;
pub mod pattern;
pub mod store;

pub use in_memory::InMemoryPatternStore;
pub use pattern::{AccountOverride, AmountRange, LearnedPattern, PatternAction, PatternPredicate};
pub use store::PatternStore;

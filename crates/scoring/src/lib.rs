//! Confidence scoring for proposed entries.
//!
//! Five independent, additively-combined signal factors produce a bounded
//! trust score in [0, 100]. Scoring is a pure function of the proposal, the
//! transaction history snapshot and the pattern store state at call time —
//! deterministic and re-invocable (the rescore path after a pattern update
//! uses the exact same function).

pub mod history;
pub mod score;
pub mod scorer;

pub use history::{AmountStats, HistoricalEntry, ModalPattern, TransactionHistory};
pub use score::{Factor, FactorScore, Score};
pub use scorer::{ConfidenceScorer, ScorerConfig};

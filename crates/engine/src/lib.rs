//! `ledgerpilot-engine` — the decision point of the core.
//!
//! Wires the scorer, pattern store, ledger and review queue together:
//! routing (auto-post or escalate), human resolutions (approve/correct),
//! rescoring after pattern updates, and the corrections learner that closes
//! the feedback loop.

pub mod config;
pub mod events;
pub mod history;
pub mod learner;
pub mod resolution;
pub mod router;


pub use config::ThresholdConfig;
pub use events::EngineEvent;
pub use history::{HistoryProvider, InMemoryHistoryProvider};
pub use learner::{LearnOutcome, Learner, LearnerWorker};
pub use resolution::{RescoreOutcome, ResolutionService};
pub use router::{Router, RoutingOutcome};

//! `ledgerpilot-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! strongly-typed identifiers, the domain error taxonomy, and the accounting
//! period value type shared by every other crate in the workspace.

pub mod error;
pub mod id;
pub mod period;

pub use error::{DomainError, DomainResult};
pub use id::{
    AccountCode, CorrectionId, CounterpartyId, EntryId, PatternId, QueueItemId, ResolverId,
    TenantId,
};
pub use period::Period;

//! Review queue for escalated proposals.
//!
//! A queue item wraps a proposal that did not clear the auto-post threshold.
//! Its state machine is strict: Pending → Approved or Pending → Corrected,
//! both terminal, nothing moves backward.

pub mod in_memory;
pub mod item;
pub mod store;

pub use in_memory::InMemoryQueueStore;
pub use item::{Correction, IssueCategory, Priority, QueueItem, Resolution, Status};
pub use store::QueueStore;

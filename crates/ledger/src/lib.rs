//! Ledger module (append-only double-entry store).
//!
//! Pure domain logic plus the store seam: no IO, no HTTP, no database
//! concerns. The in-memory store is the reference implementation of the
//! posting, reversal and query contracts.

pub mod entry;
pub mod in_memory;
pub mod line;
pub mod proposal;
pub mod store;

pub use entry::{Entry, EntryLine, SourceType};
pub use in_memory::InMemoryLedgerStore;
pub use line::{Line, validate_lines};
pub use proposal::{DocumentCategory, Proposal};
pub use store::{AccountBalance, LedgerStore};

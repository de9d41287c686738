//! `ledgerpilot-events` — event and pub/sub primitives.
//!
//! The decision core is mostly synchronous; this crate carries the one
//! deliberately asynchronous hop: a recorded `Correction` is published on a
//! bus and consumed by the learner on a background worker, so the resolver's
//! call never blocks on pattern learning or the pending-item rescan.

pub mod bus;
pub mod event;
pub mod in_memory;
pub mod tenant;
pub mod worker;

pub use bus::{EventBus, Subscription};
pub use event::Event;
pub use in_memory::{InMemoryBusError, InMemoryEventBus};
pub use tenant::TenantScoped;
pub use worker::{EventWorker, WorkerHandle};

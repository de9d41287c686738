//! Process-wide tracing/logging setup for binaries and test harnesses.

/// Initialize observability for the process.
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Tracing configuration (filters, layers).
pub mod tracing;

//! Process-wide tracing setup shared by binaries, benches and tests.

/// Tracing subscriber configuration (filters, formatting).
pub mod tracing;

pub use crate::tracing::{DEFAULT_FILTER, init_with_default_filter};

/// Initialize structured JSON logging with the `info` default filter.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    crate::tracing::init_with_default_filter(DEFAULT_FILTER);
}

//! Test collaborators for eagerfetch.
//!
//! Provides an in-memory row source that interprets structured SELECT
//! statements (with optional seeded row-order shuffling to simulate engine
//! nondeterminism), a scripted source for injecting malformed result sets,
//! a Northwind-style fixture, a graph comparison harness, and a registry of
//! known limitations.

pub mod assertions;
pub mod limitations;
pub mod memory;
pub mod northwind;
pub mod scripted;

pub use assertions::{assert_graphs_equal, assert_nodes_equal, GraphAssertOptions};
pub use limitations::{KnownLimitation, LimitationRegistry};
pub use memory::MemoryRowSource;
pub use scripted::ScriptedRowSource;

use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call from every test; only the
/// first call installs the subscriber. Respects `RUST_LOG`.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .with_test_writer()
            .try_init();
    });
}

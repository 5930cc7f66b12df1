//! Tracing and metrics initialization shared by the sink binaries and tests.

pub mod metrics;
pub mod tracing;

pub use crate::tracing::{init_test_tracing, init_tracing};

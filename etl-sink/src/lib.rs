//! Conversion of change records from a log-structured source into warehouse rows.
//!
//! Records are converted either into rows inserted directly into their destination table, or,
//! when upsert/delete support is enabled, into entries staged in an intermediate table and merged
//! into the destination table later. See [`sink::SinkRecordConverter`] for the entry point.

#[cfg(feature = "bigquery")]
pub mod bigquery;
pub mod conversions;
pub mod error;
mod macros;
pub mod merge;
pub mod metrics;
pub mod sink;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;

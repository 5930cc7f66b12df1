//! Testing utilities for the record conversion core.
//!
//! - [`record`] builds source records and provides converters with scripted failures.
//! - [`merge`] provides batch registries and merge triggers that record what they are asked to do.

pub mod merge;
pub mod record;

pub use merge::{RecordingMergeFlush, SequenceMergeBatches};
pub use record::{FailingRecordConverter, SinkRecordBuilder};

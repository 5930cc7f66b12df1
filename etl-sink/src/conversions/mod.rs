//! Conversions from record payloads into warehouse rows.
//!
//! Holds the [`RecordConverter`] and [`NameSanitizer`] collaborator traits with their default
//! implementations, the provenance builder for the metadata field, and the selective
//! map-to-text serialization applied to finished rows.

pub mod kafka_data;
mod record;
mod sanitize;
mod stringify;

pub use record::{JsonRecordConverter, RecordConverter, RecordType};
pub use sanitize::{InvalidCharSanitizer, NameSanitizer};
pub use stringify::{MapFieldStringifier, QUALIFIED_FIELD_SEPARATOR};

//! Common types used throughout the conversion core.
//!
//! Includes the inbound [`SinkRecord`], the destination [`TableId`] and the produced
//! [`Row`]/[`RowToInsert`] shapes.

mod record;
mod row;
mod table;

pub use record::*;
pub use row::*;
pub use table::*;

//! Staging of upsert/delete entries for the merge into final tables.
//!
//! Defines the reserved [`IntermediateField`]s shared with the merge, the [`MergeBatches`] registry
//! and [`MergeFlush`] trigger collaborators with in-memory and channel-backed implementations,
//! and the [`MergeThreshold`] deciding when a flush is requested.

mod batches;
mod fields;
mod flush;
mod threshold;

pub use batches::{MemoryMergeBatches, MergeBatches, SealedBatch, TopicPartition};
pub use fields::IntermediateField;
pub use flush::{ChannelMergeFlush, MergeFlush, MergeFlushReceiver, merge_flush_channel};
pub use threshold::MergeThreshold;

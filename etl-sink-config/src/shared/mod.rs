//! Shared configuration types for the sink.

mod base;
mod sink;

pub use base::ValidationError;
pub use sink::SinkConfig;

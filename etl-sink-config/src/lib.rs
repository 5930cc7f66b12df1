//! Configuration of the sink record conversion and its hierarchical loader.

mod environment;
mod load;
pub mod shared;

pub use environment::{APP_ENVIRONMENT_ENV_NAME, Environment};
pub use load::{Config, LoadConfigError, load_config, load_config_from, load_sink_config};

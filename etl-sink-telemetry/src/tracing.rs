use std::io;
use std::sync::Once;

use etl_sink_config::Environment;
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable enabling log output in tests.
pub const ENABLE_TRACING_ENV_NAME: &str = "ENABLE_TRACING";

static INIT_TEST_TRACING: Once = Once::new();

/// Errors raised while installing the global tracing subscriber.
#[derive(Debug, Error)]
pub enum TracingError {
    #[error("failed to determine runtime environment: {0}")]
    Environment(#[source] io::Error),

    #[error("failed to install the global tracing subscriber: {0}")]
    Init(#[from] TryInitError),
}

/// Installs the global tracing subscriber of a binary.
///
/// Filtering follows `RUST_LOG`, falling back to `default_directive` when it is unset or invalid.
/// Logs are human readable in the [`Environment::Dev`] environment and JSON lines in
/// [`Environment::Prod`]. Output goes to stderr so that stdout stays free for data.
pub fn init_tracing(default_directive: &str) -> Result<(), TracingError> {
    let environment = Environment::load().map_err(TracingError::Environment)?;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let registry = tracing_subscriber::registry().with(filter);

    match environment {
        Environment::Dev => registry
            .with(fmt::layer().with_writer(io::stderr).with_target(true))
            .try_init()?,
        Environment::Prod => registry
            .with(fmt::layer().json().with_writer(io::stderr))
            .try_init()?,
    }

    Ok(())
}

/// Installs a tracing subscriber writing to the test output when `ENABLE_TRACING` is set.
///
/// It is safe to call this function from every test, the subscriber is installed at most once.
pub fn init_test_tracing() {
    INIT_TEST_TRACING.call_once(|| {
        if std::env::var_os(ENABLE_TRACING_ENV_NAME).is_none() {
            return;
        }

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

        // Another test harness may already have installed a global subscriber.
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_test_writer())
            .try_init();
    });
}

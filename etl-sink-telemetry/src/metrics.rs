use std::sync::Mutex;
use std::time::Duration;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::trace;

/// Interval between two upkeep runs of the Prometheus recorder.
const UPKEEP_INTERVAL: Duration = Duration::from_secs(5);

// Global cache for the handle returned by [`init_metrics_handle`].
//
// The recorder is global and installing it twice fails, but tests and binaries may ask for a
// handle several times. The initialization is fallible, so a `Mutex` is used instead of a
// `OnceLock`.
static PROMETHEUS_HANDLE: Mutex<Option<PrometheusHandle>> = Mutex::new(None);

/// Installs a global Prometheus recorder and returns a handle rendering the recorded metrics.
///
/// No HTTP endpoint is started: the caller decides where the rendered text goes. Subsequent calls
/// return clones of the cached handle.
///
/// When called from within a Tokio runtime, a task periodically runs the recorder upkeep to bound
/// the memory used by histograms.
pub fn init_metrics_handle() -> Result<PrometheusHandle, BuildError> {
    let mut prometheus_handle = PROMETHEUS_HANDLE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    if let Some(handle) = &*prometheus_handle {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    *prometheus_handle = Some(handle.clone());

    if let Ok(runtime) = tokio::runtime::Handle::try_current() {
        let handle = handle.clone();
        runtime.spawn(async move {
            loop {
                tokio::time::sleep(UPKEEP_INTERVAL).await;
                trace!("running metrics upkeep");
                handle.run_upkeep();
            }
        });
    }

    Ok(handle)
}

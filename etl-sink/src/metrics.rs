//! Metrics definitions for record conversion monitoring.

use std::sync::Once;

use metrics::{Unit, describe_counter};

static REGISTER_METRICS: Once = Once::new();

/// Label for the row mode in metrics.
pub const MODE_LABEL: &str = "mode";

/// Label for error kind in metrics.
pub const ERROR_KIND_LABEL: &str = "error_kind";

/// Counter for rows produced by the record converter.
pub const ETL_SINK_ROWS_CONVERTED_TOTAL: &str = "etl_sink_rows_converted_total";

/// Counter for merge flushes requested because a batch reached the threshold.
pub const ETL_SINK_MERGE_FLUSHES_TRIGGERED_TOTAL: &str = "etl_sink_merge_flushes_triggered_total";

/// Counter for records that failed conversion.
pub const ETL_SINK_RECORD_ERRORS_TOTAL: &str = "etl_sink_record_errors_total";

/// Registers the metrics emitted by the record converter. It is safe to call this method
/// multiple times, the metrics are described only once.
pub fn register_metrics() {
    REGISTER_METRICS.call_once(|| {
        describe_counter!(
            ETL_SINK_ROWS_CONVERTED_TOTAL,
            Unit::Count,
            "Total number of rows produced from source records"
        );

        describe_counter!(
            ETL_SINK_MERGE_FLUSHES_TRIGGERED_TOTAL,
            Unit::Count,
            "Total number of merge flushes requested after a batch reached the merge threshold"
        );

        describe_counter!(
            ETL_SINK_RECORD_ERRORS_TOTAL,
            Unit::Count,
            "Total number of source records that failed conversion"
        );
    });
}

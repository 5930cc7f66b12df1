//! Conversion of source records into rows ready for the insert client.
//!
//! [`SinkRecordConverter`] is the entry point: it picks the row mode from the configuration,
//! builds the row with [`RegularRowBuilder`] or [`UpsertDeleteRowBuilder`], post-processes it with
//! [`FieldPostProcessor`] and assigns the row id derived from the record coordinates.

use std::fmt;

use etl_sink_config::shared::SinkConfig;
use metrics::counter;
use tracing::{trace, warn};

use crate::conversions::{InvalidCharSanitizer, NameSanitizer, RecordConverter};
use crate::error::SinkResult;
use crate::merge::{MergeBatches, MergeFlush};
use crate::metrics::{
    ERROR_KIND_LABEL, ETL_SINK_RECORD_ERRORS_TOTAL, ETL_SINK_ROWS_CONVERTED_TOTAL, MODE_LABEL,
    register_metrics,
};
use crate::types::{RowToInsert, SinkRecord, TableId, record_row_id};

pub mod extensions;
pub mod post_process;
pub mod regular;
pub mod upsert_delete;

pub use post_process::FieldPostProcessor;
pub use regular::RegularRowBuilder;
pub use upsert_delete::UpsertDeleteRowBuilder;

/// How rows are written to their destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowMode {
    /// Rows are inserted directly into the destination table.
    Regular,
    /// Rows are staged in an intermediate table and merged into the destination table.
    UpsertDelete,
}

impl RowMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RowMode::Regular => "regular",
            RowMode::UpsertDelete => "upsert_delete",
        }
    }
}

impl fmt::Display for RowMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
enum RowBuilder {
    Regular(RegularRowBuilder),
    UpsertDelete(UpsertDeleteRowBuilder),
}

/// Converts source records into [`RowToInsert`]s.
///
/// The converter holds no per-record state. The batch registry and the merge trigger are only
/// used in upsert/delete mode, and their concurrency guarantees are relied upon as they are: the
/// converter can be shared between threads when its collaborators can.
#[derive(Debug, Clone)]
pub struct SinkRecordConverter<C, B, F, S = InvalidCharSanitizer> {
    builder: RowBuilder,
    post_processor: FieldPostProcessor<S>,
    converter: C,
    batches: B,
    flush: F,
}

impl<C, B, F> SinkRecordConverter<C, B, F, InvalidCharSanitizer>
where
    C: RecordConverter,
    B: MergeBatches,
    F: MergeFlush,
{
    /// Creates a converter sanitizing field names with [`InvalidCharSanitizer`].
    pub fn new(config: &SinkConfig, converter: C, batches: B, flush: F) -> Self {
        Self::with_name_sanitizer(config, converter, batches, flush, InvalidCharSanitizer)
    }
}

impl<C, B, F, S> SinkRecordConverter<C, B, F, S>
where
    C: RecordConverter,
    B: MergeBatches,
    F: MergeFlush,
    S: NameSanitizer,
{
    /// Creates a converter sanitizing field names with `sanitizer` when sanitization is enabled.
    pub fn with_name_sanitizer(
        config: &SinkConfig,
        converter: C,
        batches: B,
        flush: F,
        sanitizer: S,
    ) -> Self {
        register_metrics();

        let builder = if config.is_upsert_delete_enabled() {
            RowBuilder::UpsertDelete(UpsertDeleteRowBuilder::new(config))
        } else {
            RowBuilder::Regular(RegularRowBuilder::new(config))
        };

        Self {
            builder,
            post_processor: FieldPostProcessor::with_sanitizer(config, sanitizer),
            converter,
            batches,
            flush,
        }
    }

    /// Returns the row mode selected from the configuration.
    pub fn mode(&self) -> RowMode {
        match self.builder {
            RowBuilder::Regular(_) => RowMode::Regular,
            RowBuilder::UpsertDelete(_) => RowMode::UpsertDelete,
        }
    }

    /// Converts `record`, destined for `table_id`, into the row handed to the insert client.
    ///
    /// In upsert/delete mode `table_id` identifies the intermediate table the entry is staged in,
    /// and the record is registered in its current batch.
    pub fn get_record_row(&self, record: &SinkRecord, table_id: &TableId) -> SinkResult<RowToInsert> {
        let mode = self.mode();

        match self.build_row(record, table_id) {
            Ok(row) => {
                trace!(%record, table = %table_id, %mode, "converted record into row");
                counter!(ETL_SINK_ROWS_CONVERTED_TOTAL, MODE_LABEL => mode.as_str()).increment(1);

                Ok(row)
            }
            Err(err) => {
                if err.kind().is_fatal_record_error() {
                    warn!(
                        %record,
                        table = %table_id,
                        error = %err,
                        "record violates an invariant required by the merge"
                    );
                }

                counter!(
                    ETL_SINK_RECORD_ERRORS_TOTAL,
                    ERROR_KIND_LABEL => format!("{:?}", err.kind())
                )
                .increment(1);

                Err(err)
            }
        }
    }

    fn build_row(&self, record: &SinkRecord, table_id: &TableId) -> SinkResult<RowToInsert> {
        let row = match &self.builder {
            RowBuilder::Regular(builder) => builder.build_row(record, &self.converter)?,
            RowBuilder::UpsertDelete(builder) => builder.build_row(
                record,
                table_id,
                &self.converter,
                &self.batches,
                &self.flush,
            )?,
        };

        let row = self.post_processor.process(&record.topic, row)?;

        Ok(RowToInsert::new(record_row_id(record), row))
    }
}

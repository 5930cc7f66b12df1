//! Sink Example: JSON-lines record conversion
//!
//! Reads change records encoded as JSON lines, converts each of them into the row a warehouse
//! sink would insert, and prints the rows as JSON lines on stdout. In upsert/delete mode a merge
//! worker logs every merge flush request and seals the batch of the requested table.
//!
//! ```text
//! echo '{"topic":"orders","partition":0,"offset":1,"key":{"id":1},"value":{"id":1}}' \
//!     | cargo run -p etl-sink-examples -- --config-dir etl-sink-examples/configuration
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use etl_sink::conversions::JsonRecordConverter;
use etl_sink::merge::{MemoryMergeBatches, MergeFlushReceiver, merge_flush_channel};
use etl_sink::sink::SinkRecordConverter;
use etl_sink::types::{SinkRecord, TableId};
use etl_sink_config::shared::SinkConfig;
use etl_sink_config::{Environment, load_config_from};
use etl_sink_telemetry::init_tracing;
use etl_sink_telemetry::metrics::init_metrics_handle;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "sink", version, about)]
struct AppArgs {
    /// File with one JSON-encoded record per line (default: stdin)
    #[arg(long)]
    input: Option<PathBuf>,

    /// Directory holding the base and environment configuration files
    #[arg(long, default_value = "configuration")]
    config_dir: PathBuf,

    /// Dataset of the destination tables
    #[arg(long, default_value = "stage")]
    dataset: String,

    /// Destination table for every record (default: the record topic)
    #[arg(long)]
    table: Option<String>,

    /// Print the recorded metrics in the Prometheus text format to stderr on exit
    #[arg(long)]
    print_metrics: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("etl_sink=info,etl_sink_examples=info")?;

    if let Err(err) = main_impl().await {
        error!(error = %err, "record conversion failed");
        return Err(err);
    }

    Ok(())
}

async fn main_impl() -> anyhow::Result<()> {
    let args = AppArgs::parse();

    let metrics_handle = if args.print_metrics {
        Some(init_metrics_handle().context("failed to install the metrics recorder")?)
    } else {
        None
    };

    let environment = Environment::load().context("failed to determine runtime environment")?;
    let config: SinkConfig = load_config_from(&args.config_dir, environment)
        .context("failed to load sink configuration")?;
    config.validate().context("invalid sink configuration")?;

    info!(
        %environment,
        upsert_delete = config.is_upsert_delete_enabled(),
        merge_records_threshold = config.merge_records_threshold,
        "loaded sink configuration"
    );

    let batches = MemoryMergeBatches::new();
    let (flush, receiver) = merge_flush_channel();
    let merge_worker = tokio::spawn(run_merge_worker(receiver, batches.clone()));

    let converter = SinkRecordConverter::new(&config, JsonRecordConverter::new(), batches, flush);
    info!(mode = %converter.mode(), "converting records");

    let converted = match &args.input {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("failed to open `{}`", path.display()))?;
            convert_lines(file, &converter, &args).await?
        }
        None => convert_lines(tokio::io::stdin(), &converter, &args).await?,
    };

    // Closing the trigger lets the merge worker drain its pending requests and stop.
    drop(converter);
    merge_worker.await.context("merge worker panicked")?;

    info!(converted, "record conversion finished");

    if let Some(handle) = metrics_handle {
        eprintln!("{}", handle.render());
    }

    Ok(())
}

/// Converts every record read from `input` and writes the rows to stdout.
///
/// Records failing conversion are logged and skipped, except for records violating an invariant
/// of the merge, which abort the run.
async fn convert_lines<R, C, B, F>(
    input: R,
    converter: &SinkRecordConverter<C, B, F>,
    args: &AppArgs,
) -> anyhow::Result<u64>
where
    R: AsyncRead + Unpin,
    C: etl_sink::conversions::RecordConverter,
    B: etl_sink::merge::MergeBatches,
    F: etl_sink::merge::MergeFlush,
{
    let mut lines = BufReader::new(input).lines();
    let mut stdout = tokio::io::stdout();
    let mut converted = 0;
    let mut line_number = 0;

    while let Some(line) = lines.next_line().await? {
        line_number += 1;
        if line.trim().is_empty() {
            continue;
        }

        let record: SinkRecord = serde_json::from_str(&line)
            .with_context(|| format!("line {line_number} is not a valid record"))?;
        let table_id = TableId::new(
            args.dataset.clone(),
            args.table.clone().unwrap_or_else(|| record.topic.clone()),
        );

        let row = match converter.get_record_row(&record, &table_id) {
            Ok(row) => row,
            Err(err) if err.kind().is_fatal_record_error() => {
                return Err(err).with_context(|| format!("record {record} cannot be staged"));
            }
            Err(err) => {
                error!(%record, error = %err, "skipping record that failed conversion");
                continue;
            }
        };

        let mut output = serde_json::to_vec(&row)?;
        output.push(b'\n');
        stdout.write_all(&output).await?;
        converted += 1;
    }

    stdout.flush().await?;

    Ok(converted)
}

/// Seals the batch of every table a merge flush is requested for.
///
/// Stands in for the merge engine, which would merge the sealed batch into the final table.
async fn run_merge_worker(mut receiver: MergeFlushReceiver, batches: MemoryMergeBatches) {
    while let Some(table_id) = receiver.recv().await {
        match batches.seal_batch(&table_id) {
            Ok(Some(batch)) => info!(
                table = %table_id,
                batch_number = batch.batch_number,
                size = batch.size,
                "merge flush requested, sealed batch"
            ),
            Ok(None) => info!(table = %table_id, "merge flush requested, nothing to merge"),
            Err(err) => error!(table = %table_id, error = %err, "failed to seal batch"),
        }
    }
}

//! Host loop: reads newline-delimited JSON, batches it and drives a sink.

use crate::error::CliError;
use chrono::Utc;
use model::records::{batch::Batch, record::Record};
use serde::Serialize;
use sink_core::{outcome::FlushOutcome, retry::RetryPolicy, sink::Sink};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct ShipOptions {
    pub tag: String,
    pub batch_size: usize,
    /// Governs re-delivery of batches answered with `Retry`.
    pub retry: RetryPolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShipReport {
    pub records_read: u64,
    pub malformed_lines: u64,
    pub batches_delivered: u64,
    pub batches_rejected: u64,
    /// Batches given up on after the last retry, or at shutdown.
    pub batches_abandoned: u64,
    pub records_delivered: u64,
    pub retries: u64,
    pub interrupted: bool,
}

enum Delivery {
    Delivered,
    Rejected,
    Abandoned,
}

pub async fn ship<S, R>(
    sink: &mut S,
    reader: R,
    options: &ShipOptions,
    cancel: &CancellationToken,
) -> Result<ShipReport, CliError>
where
    S: Sink + ?Sized,
    R: AsyncBufRead + Unpin,
{
    let batch_size = options.batch_size.max(1);
    let mut report = ShipReport::default();
    let mut segments = reader.split(b'\n');
    let mut batch = Batch::new(&options.tag, Vec::with_capacity(batch_size));
    let mut line_no = 0u64;
    let mut read_error = None;

    loop {
        let segment = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                report.interrupted = true;
                break;
            }
            segment = segments.next_segment() => segment,
        };

        let bytes = match segment {
            Ok(Some(bytes)) => bytes,
            Ok(None) => break,
            Err(err) => {
                error!(line = line_no + 1, error = %err, "Failed to read input");
                read_error = Some(err);
                break;
            }
        };
        line_no += 1;

        let line = match std::str::from_utf8(&bytes) {
            Ok(line) => line.trim_end_matches('\r'),
            Err(err) => {
                warn!(line = line_no, error = %err, "Skipping line that is not UTF-8");
                report.malformed_lines += 1;
                continue;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        match Record::from_json(Utc::now(), line) {
            Ok(record) => {
                report.records_read += 1;
                batch.push(record);
            }
            Err(err) => {
                warn!(line = line_no, error = %err, "Skipping malformed record");
                report.malformed_lines += 1;
                continue;
            }
        }

        if batch.len() >= batch_size {
            let full = std::mem::replace(
                &mut batch,
                Batch::new(&options.tag, Vec::with_capacity(batch_size)),
            );
            deliver(sink, &full, options, cancel, &mut report).await;
        }
    }

    // Records read before an interruption or a read failure are still delivered.
    if !batch.is_empty() {
        deliver(sink, &batch, options, cancel, &mut report).await;
    }

    sink.exit().await;

    info!(
        records = report.records_read,
        delivered = report.batches_delivered,
        rejected = report.batches_rejected,
        abandoned = report.batches_abandoned,
        malformed = report.malformed_lines,
        "Shipping finished"
    );

    match read_error {
        Some(err) => Err(err.into()),
        None => Ok(report),
    }
}

async fn deliver<S>(
    sink: &mut S,
    batch: &Batch,
    options: &ShipOptions,
    cancel: &CancellationToken,
    report: &mut ShipReport,
) where
    S: Sink + ?Sized,
{
    let outcome = deliver_with_retry(sink, batch, options, cancel, report).await;
    match outcome {
        Delivery::Delivered => {
            report.batches_delivered += 1;
            report.records_delivered += batch.len() as u64;
        }
        Delivery::Rejected => report.batches_rejected += 1,
        Delivery::Abandoned => report.batches_abandoned += 1,
    }
}

async fn deliver_with_retry<S>(
    sink: &mut S,
    batch: &Batch,
    options: &ShipOptions,
    cancel: &CancellationToken,
    report: &mut ShipReport,
) -> Delivery
where
    S: Sink + ?Sized,
{
    let mut attempt = 0;

    loop {
        match sink.flush(batch).await {
            FlushOutcome::Ok => {
                debug!(records = batch.len(), attempt, "Batch accepted");
                return Delivery::Delivered;
            }
            FlushOutcome::Error => {
                error!(records = batch.len(), tag = %batch.tag, "Batch rejected, dropping it");
                return Delivery::Rejected;
            }
            FlushOutcome::Retry => {
                if attempt + 1 >= options.retry.max_attempts {
                    error!(
                        records = batch.len(),
                        attempts = attempt + 1,
                        "Batch still not accepted, giving up"
                    );
                    return Delivery::Abandoned;
                }

                let delay = options.retry.backoff_delay(attempt);
                warn!(
                    records = batch.len(),
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    "Sink asked for retry"
                );
                report.retries += 1;

                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        warn!(records = batch.len(), "Shutdown during retry, abandoning batch");
                        report.interrupted = true;
                        return Delivery::Abandoned;
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
                attempt += 1;
            }
        }
    }
}

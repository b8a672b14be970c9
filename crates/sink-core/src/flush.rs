//! One flush cycle: check the link, encode, build, dispatch, collect.

use crate::{encoder, metrics::Metrics, outcome::FlushOutcome};
use connectors::sql::base::{
    connection::{Connection, Health, ResultPoll},
    query::generator::QueryGenerator,
    session::Driver,
};
use model::{execution::connection::PayloadMode, records::batch::Batch};
use planner::query::{ast::common::QuotedTable, dialect};
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub struct FlushCoordinator<D: Driver> {
    connection: Connection<D>,
    table: QuotedTable,
    time_key: String,
    payload: PayloadMode,
    result_wait: Option<Duration>,
    metrics: Metrics,
}

impl<D: Driver> FlushCoordinator<D> {
    /// `table` is the escaped identifier computed at init; it is never
    /// re-derived from the raw configured name.
    pub fn new(connection: Connection<D>, table: QuotedTable) -> Self {
        let config = connection.config();
        let time_key = config.time_key.clone();
        let payload = config.payload;
        let result_wait = config.result_wait();

        FlushCoordinator {
            connection,
            table,
            time_key,
            payload,
            result_wait,
            metrics: Metrics::new(),
        }
    }

    pub async fn flush(&mut self, batch: &Batch) -> FlushOutcome {
        self.metrics.increment_flushes();

        if self.connection.health_check() == Health::Unhealthy {
            warn!(
                host = %self.connection.config().host,
                port = %self.connection.config().port,
                dbname = %self.connection.config().database,
                "Connection unhealthy, resetting"
            );
            self.connection.reset();
            self.metrics.increment_retries();
            return FlushOutcome::Retry;
        }

        let document = match encoder::encode(batch, &self.time_key) {
            Ok(document) => document,
            Err(err) => {
                error!(tag = %batch.tag, error = %err, "Failed to encode batch");
                self.metrics.increment_failures();
                return FlushOutcome::Error;
            }
        };

        let statement = QueryGenerator::new(&dialect::Postgres).json_array_insert(
            &self.table,
            document.as_str(),
            self.payload,
        );

        debug!(
            tag = %batch.tag,
            records = batch.len(),
            bytes = document.as_str().len(),
            table = %self.table,
            "Dispatching batch"
        );

        if let Err(err) = self.connection.dispatch(statement) {
            error!(table = %self.table, error = %err.diagnostic(), "Failed to send query");
            self.metrics.increment_failures();
            return FlushOutcome::Error;
        }

        let poll = match self.result_wait {
            Some(limit) => self.connection.await_result(limit).await,
            None => self.connection.poll_result(),
        };

        match poll {
            ResultPoll::Ready(Ok(rows)) => {
                debug!(rows, table = %self.table, "Batch written");
                self.metrics.increment_records(batch.len() as u64);
                FlushOutcome::Ok
            }
            ResultPoll::Ready(Err(err)) => {
                // The statement may have committed before a lost link was
                // noticed, so this is never retried. A closed link is reset
                // by the next cycle's health check.
                error!(
                    table = %self.table,
                    connection_lost = err.is_connection_loss(),
                    error = %err.diagnostic(),
                    "Batch rejected"
                );
                self.metrics.increment_failures();
                FlushOutcome::Error
            }
            ResultPoll::Pending | ResultPoll::Idle => {
                debug!(table = %self.table, "Result deferred to a later cycle");
                self.metrics.increment_records(batch.len() as u64);
                self.metrics.increment_deferred();
                FlushOutcome::Ok
            }
        }
    }

    pub async fn shutdown(&mut self) {
        self.connection.shutdown().await;

        let snapshot = self.metrics.snapshot(self.connection.deferred_failures());
        info!(
            flushes = snapshot.flushes,
            records = snapshot.records_written,
            retries = snapshot.retry_count,
            failures = snapshot.failure_count,
            deferred_failures = snapshot.deferred_failures,
            "Sink stopped"
        );
    }

    pub fn connection(&self) -> &Connection<D> {
        &self.connection
    }

    pub fn table(&self) -> &QuotedTable {
        &self.table
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

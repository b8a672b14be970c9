//! Lifecycle of the single database session owned by a sink.
//!
//! Statements are dispatched onto the tokio runtime and their results are
//! polled later, so a flush never waits on a database round trip. A lost
//! session is re-established in the background; the outcome only becomes
//! visible through [`Connection::health_check`].

use crate::sql::base::{
    error::{ConnectorError, DbError},
    query::generator::QueryGenerator,
    session::{Driver, Session},
};
use futures_util::FutureExt;
use model::execution::connection::ConnectionConfig;
use planner::query::{Statement, ast::common::QuotedTable, dialect};
use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};
use tokio::{
    runtime::Handle,
    task::{JoinError, JoinHandle},
};
use tracing::{debug, error, info, warn};

type StatementTask = JoinHandle<Result<u64, DbError>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
    /// A dispatched statement has not finished yet.
    Busy,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Health {
    Healthy,
    Unhealthy,
}

/// Result of looking at the outstanding statement.
#[derive(Debug)]
pub enum ResultPoll {
    /// Nothing was dispatched since the last collected result.
    Idle,
    /// Still running on the server.
    Pending,
    Ready(Result<u64, DbError>),
}

pub struct Connection<D: Driver> {
    driver: Arc<D>,
    config: Arc<ConnectionConfig>,
    session: Option<Arc<D::Session>>,
    outstanding: Option<StatementTask>,
    reconnect: Option<JoinHandle<Result<D::Session, ConnectorError>>>,
    runtime: Option<Handle>,
    last_failure: Option<String>,
    deferred_failures: Arc<AtomicU64>,
    released: bool,
}

impl<D: Driver> Connection<D> {
    /// Opens the session and waits for the handshake to complete.
    pub async fn initialize(driver: D, config: ConnectionConfig) -> Result<Self, ConnectorError> {
        let config = config.with_defaults();

        let session = match driver.connect(&config).await {
            Ok(session) => session,
            Err(err) => {
                error!(
                    host = %config.host,
                    port = %config.port,
                    dbname = %config.database,
                    error = %err,
                    "Connection failed"
                );
                return Err(err);
            }
        };

        debug!(
            host = %config.host,
            port = %config.port,
            dbname = %config.database,
            "Connection OK"
        );

        Ok(Connection {
            driver: Arc::new(driver),
            config: Arc::new(config),
            session: Some(Arc::new(session)),
            outstanding: None,
            reconnect: None,
            runtime: None,
            last_failure: None,
            deferred_failures: Arc::new(AtomicU64::new(0)),
            released: false,
        })
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Runs the idempotent bootstrap DDL for `table` and waits for it.
    pub async fn ensure_table_exists(&mut self, table: &QuotedTable) -> Result<(), DbError> {
        let session = self.session.clone().ok_or(DbError::NotConnected)?;
        let statement = QueryGenerator::new(&dialect::Postgres).create_json_table(table);

        debug!(sql = %statement.sql, "Ensuring destination table exists");

        session.execute(&statement).await.map_err(|err| {
            error!(
                table = %table,
                dbname = %self.config.database,
                error = %err.diagnostic(),
                "Failed to create destination table"
            );
            err
        })?;
        Ok(())
    }

    /// From here on [`dispatch`](Self::dispatch) returns immediately and
    /// results are collected by polling.
    pub fn set_nonblocking(&mut self) -> Result<(), ConnectorError> {
        if self.session.is_none() {
            return Err(ConnectorError::NonBlocking(
                "connection is not established".to_string(),
            ));
        }

        let handle =
            Handle::try_current().map_err(|e| ConnectorError::NonBlocking(e.to_string()))?;
        self.runtime = Some(handle);
        Ok(())
    }

    pub fn is_nonblocking(&self) -> bool {
        self.runtime.is_some()
    }

    pub fn state(&self) -> ConnectionState {
        if self.released {
            return ConnectionState::Disconnected;
        }

        match &self.session {
            Some(session) if session.is_closed() => ConnectionState::Failed,
            Some(_) if self.outstanding.as_ref().is_some_and(|t| !t.is_finished()) => {
                ConnectionState::Busy
            }
            Some(_) => ConnectionState::Connected,
            None if self.last_failure.is_some() => ConnectionState::Failed,
            None => ConnectionState::Disconnected,
        }
    }

    /// Reports link status without waiting on the network.
    ///
    /// Also picks up a finished background reconnect and collects the result
    /// of a finished statement that no flush has looked at.
    pub fn health_check(&mut self) -> Health {
        if self.released {
            return Health::Unhealthy;
        }

        self.adopt_reconnect();
        self.drain_finished();

        match &self.session {
            Some(session) if !session.is_closed() => Health::Healthy,
            _ => Health::Unhealthy,
        }
    }

    /// Drops the current session and starts re-establishing it in the
    /// background with the original settings. Calling it again while a
    /// reconnect is underway does nothing.
    pub fn reset(&mut self) {
        if self.released {
            debug!("Reset ignored, connection already released");
            return;
        }

        if self.reconnect.is_some() {
            debug!("Reconnect already in progress");
            return;
        }

        if self.outstanding.take().is_some() {
            warn!("Abandoning result of a statement dispatched on the lost connection");
        }
        self.session = None;

        let Some(runtime) = self.runtime.clone().or_else(|| Handle::try_current().ok()) else {
            self.last_failure = Some("no async runtime available for reconnect".to_string());
            warn!("Cannot reconnect without an async runtime");
            return;
        };

        info!(
            host = %self.config.host,
            port = %self.config.port,
            dbname = %self.config.database,
            "Resetting connection"
        );

        let driver = self.driver.clone();
        let config = self.config.clone();
        self.reconnect = Some(runtime.spawn(async move { driver.connect(&config).await }));
    }

    /// Sends `statement` without waiting for it to run.
    ///
    /// A statement dispatched while an earlier one is still outstanding is
    /// queued behind it, so the server sees them one at a time and in order.
    pub fn dispatch(&mut self, statement: Statement) -> Result<(), DbError> {
        let runtime = self.runtime.clone().ok_or(DbError::Blocking)?;
        let session = self.session.clone().ok_or(DbError::NotConnected)?;
        if session.is_closed() {
            return Err(DbError::Closed);
        }

        let previous = self.outstanding.take();
        let deferred_failures = self.deferred_failures.clone();

        let task = runtime.spawn(async move {
            if let Some(previous) = previous {
                record_deferred(flatten(previous.await), &deferred_failures);
            }
            session.execute(&statement).await
        });
        self.outstanding = Some(task);
        Ok(())
    }

    /// Takes the outstanding result if it is ready, without waiting.
    pub fn poll_result(&mut self) -> ResultPoll {
        let Some(mut task) = self.outstanding.take() else {
            return ResultPoll::Idle;
        };

        match (&mut task).now_or_never() {
            Some(joined) => ResultPoll::Ready(flatten(joined)),
            None => {
                self.outstanding = Some(task);
                ResultPoll::Pending
            }
        }
    }

    /// Like [`poll_result`](Self::poll_result) but waits up to `limit`.
    pub async fn await_result(&mut self, limit: Duration) -> ResultPoll {
        let Some(mut task) = self.outstanding.take() else {
            return ResultPoll::Idle;
        };

        match tokio::time::timeout(limit, &mut task).await {
            Ok(joined) => ResultPoll::Ready(flatten(joined)),
            Err(_) => {
                self.outstanding = Some(task);
                ResultPoll::Pending
            }
        }
    }

    /// Failed statements whose results were only collected after the flush
    /// that sent them had already returned.
    pub fn deferred_failures(&self) -> u64 {
        self.deferred_failures.load(Ordering::Relaxed)
    }

    /// Waits for the outstanding statement, then releases the session.
    /// Safe to call more than once.
    pub async fn shutdown(&mut self) {
        if self.released {
            debug!("Connection already released");
            return;
        }
        self.released = true;

        if let Some(task) = self.reconnect.take() {
            task.abort();
        }

        if let Some(task) = self.outstanding.take() {
            match flatten(task.await) {
                Ok(rows) => debug!(rows, "Drained outstanding statement"),
                Err(err) => {
                    self.deferred_failures.fetch_add(1, Ordering::Relaxed);
                    warn!(error = %err.diagnostic(), "Outstanding statement failed during shutdown");
                }
            }
        }

        self.session = None;
        self.runtime = None;

        info!(
            host = %self.config.host,
            port = %self.config.port,
            dbname = %self.config.database,
            "Connection released"
        );
    }

    fn adopt_reconnect(&mut self) {
        let Some(mut task) = self.reconnect.take() else {
            return;
        };

        match (&mut task).now_or_never() {
            None => self.reconnect = Some(task),
            Some(Ok(Ok(session))) => {
                info!(
                    host = %self.config.host,
                    port = %self.config.port,
                    dbname = %self.config.database,
                    "Reconnected"
                );
                self.session = Some(Arc::new(session));
                self.last_failure = None;
            }
            Some(Ok(Err(err))) => {
                warn!(
                    host = %self.config.host,
                    port = %self.config.port,
                    dbname = %self.config.database,
                    error = %err,
                    "Reconnect failed"
                );
                self.last_failure = Some(err.to_string());
            }
            Some(Err(join_err)) => {
                warn!(error = %join_err, "Reconnect task did not complete");
                self.last_failure = Some(join_err.to_string());
            }
        }
    }

    fn drain_finished(&mut self) {
        if let ResultPoll::Ready(result) = self.poll_result() {
            record_deferred(result, &self.deferred_failures);
        }
    }
}

fn flatten(joined: Result<Result<u64, DbError>, JoinError>) -> Result<u64, DbError> {
    joined.unwrap_or_else(|e| Err(DbError::Task(e.to_string())))
}

fn record_deferred(result: Result<u64, DbError>, failures: &AtomicU64) {
    match result {
        Ok(rows) => debug!(rows, "Deferred statement completed"),
        Err(err) => {
            failures.fetch_add(1, Ordering::Relaxed);
            error!(error = %err.diagnostic(), "Deferred statement failed");
        }
    }
}

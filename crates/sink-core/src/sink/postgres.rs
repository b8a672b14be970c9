use crate::{
    error::InitError,
    flush::FlushCoordinator,
    metrics::MetricsSnapshot,
    outcome::FlushOutcome,
    sink::Sink,
};
use async_trait::async_trait;
use connectors::sql::{
    base::{connection::Connection, query::generator::QueryGenerator, session::Driver},
    postgres::adapter::PgDriver,
};
use model::{
    execution::{connection::ConnectionConfig, properties::Properties},
    records::batch::Batch,
};
use planner::query::{ast::common::QuotedTable, dialect};
use tracing::{info, warn};

/// A sink writing every batch into one table over one connection.
pub struct DatabaseSink<D: Driver> {
    coordinator: FlushCoordinator<D>,
    exited: bool,
}

pub type PgSink = DatabaseSink<PgDriver>;

impl PgSink {
    pub async fn connect(config: ConnectionConfig) -> Result<Self, InitError> {
        Self::init(PgDriver, config).await
    }

    pub async fn from_properties(props: &Properties) -> Result<Self, InitError> {
        let config = ConnectionConfig::from_properties(props)?;
        Self::connect(config).await
    }
}

impl<D: Driver> DatabaseSink<D> {
    /// Connects, creates the destination table if needed and switches the
    /// connection to non-blocking mode. No flush is accepted before this
    /// returns successfully.
    pub async fn init(driver: D, config: ConnectionConfig) -> Result<Self, InitError> {
        let config = config.with_defaults();
        let endpoint = format!("{}:{}/{}", config.host, config.port, config.database);

        let mut connection = Connection::initialize(driver, config)
            .await
            .map_err(|source| InitError::Connect {
                endpoint: endpoint.clone(),
                source,
            })?;

        let table = QueryGenerator::new(&dialect::Postgres).quote_table(&connection.config().table);

        if let Err(source) = connection.ensure_table_exists(&table).await {
            connection.shutdown().await;
            return Err(InitError::Schema {
                table: table.to_string(),
                source,
            });
        }

        if let Err(err) = connection.set_nonblocking() {
            connection.shutdown().await;
            return Err(InitError::Config(err));
        }

        info!(endpoint = %endpoint, table = %table, "Sink ready");

        Ok(DatabaseSink {
            coordinator: FlushCoordinator::new(connection, table),
            exited: false,
        })
    }

    pub fn table(&self) -> &QuotedTable {
        self.coordinator.table()
    }

    pub fn connection(&self) -> &Connection<D> {
        self.coordinator.connection()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.coordinator
            .metrics()
            .snapshot(self.coordinator.connection().deferred_failures())
    }
}

#[async_trait]
impl<D: Driver> Sink for DatabaseSink<D> {
    async fn flush(&mut self, batch: &Batch) -> FlushOutcome {
        if self.exited {
            warn!(tag = %batch.tag, "Flush after exit rejected");
            return FlushOutcome::Error;
        }
        self.coordinator.flush(batch).await
    }

    async fn exit(&mut self) {
        if self.exited {
            return;
        }
        self.exited = true;
        self.coordinator.shutdown().await;
    }
}

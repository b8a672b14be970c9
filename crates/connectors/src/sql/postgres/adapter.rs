use crate::sql::{
    base::{
        error::{ConnectorError, DbError},
        session::{Driver, Session},
    },
    postgres::utils::{connect_client, pg_config},
};
use async_trait::async_trait;
use model::execution::connection::ConnectionConfig;
use planner::query::Statement;
use tokio_postgres::{Client, types::ToSql};
use tracing::debug;

/// Opens tokio-postgres sessions.
#[derive(Debug, Clone, Default)]
pub struct PgDriver;

#[async_trait]
impl Driver for PgDriver {
    type Session = PgSession;

    async fn connect(&self, config: &ConnectionConfig) -> Result<PgSession, ConnectorError> {
        let pg = pg_config(config)?;
        let client = connect_client(pg).await?;
        Ok(PgSession { client })
    }
}

pub struct PgSession {
    client: Client,
}

#[async_trait]
impl Session for PgSession {
    fn is_closed(&self) -> bool {
        self.client.is_closed()
    }

    async fn execute(&self, statement: &Statement) -> Result<u64, DbError> {
        if !statement.is_parameterized() {
            // Simple query protocol, same round trip as a plain exec.
            self.client.batch_execute(&statement.sql).await?;
            return Ok(0);
        }

        let params = statement
            .params
            .iter()
            .map(|p| p as &(dyn ToSql + Sync))
            .collect::<Vec<_>>();

        let rows = self
            .client
            .execute(statement.sql.as_str(), &params)
            .await?;
        debug!(rows, "Statement executed");
        Ok(rows)
    }
}

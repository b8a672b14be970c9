use crate::sql::base::error::{ConnectorError, DbError};
use async_trait::async_trait;
use model::execution::connection::ConnectionConfig;
use planner::query::Statement;

/// One authenticated database session.
#[async_trait]
pub trait Session: Send + Sync + 'static {
    /// Reports whether the link is gone, without touching the network.
    fn is_closed(&self) -> bool;

    /// Runs one statement to completion and returns the affected row count.
    async fn execute(&self, statement: &Statement) -> Result<u64, DbError>;
}

/// Opens sessions; kept around so a dropped session can be re-established.
#[async_trait]
pub trait Driver: Send + Sync + 'static {
    type Session: Session;

    async fn connect(&self, config: &ConnectionConfig) -> Result<Self::Session, ConnectorError>;
}

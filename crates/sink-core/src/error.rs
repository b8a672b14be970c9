use connectors::sql::base::error::{ConnectorError, DbError};
use model::execution::errors::ConfigError;
use thiserror::Error;

/// Reasons a sink could not start. None of them are retried by the sink.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("Invalid sink settings: {0}")]
    Settings(#[from] ConfigError),

    #[error("Failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: ConnectorError,
    },

    #[error("Failed to create table {table}: {source}")]
    Schema {
        table: String,
        #[source]
        source: DbError,
    },

    #[error("Failed to switch connection to non-blocking mode: {0}")]
    Config(#[source] ConnectorError),
}

impl InitError {
    /// Connection refusals may clear up on their own; the rest will not.
    pub fn is_transient(&self) -> bool {
        match self {
            InitError::Connect { source, .. } => matches!(
                source,
                ConnectorError::Connection(_) | ConnectorError::Handshake(_)
            ),
            _ => false,
        }
    }
}

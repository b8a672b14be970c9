use model::execution::errors::ConfigError;
use thiserror::Error;

/// All errors coming from the database/query layer.
#[derive(Debug, Error)]
pub enum DbError {
    /// The server rejected the statement.
    #[error("Statement failed: {message}")]
    Statement {
        code: Option<String>,
        message: String,
    },

    /// The link to the server is gone.
    #[error("Connection closed")]
    Closed,

    /// No session is currently established.
    #[error("Not connected")]
    NotConnected,

    /// Dispatch was attempted before the connection entered non-blocking mode.
    #[error("Connection is not in non-blocking mode")]
    Blocking,

    /// Any other driver error.
    #[error("Postgres error: {0}")]
    PgError(tokio_postgres::Error),

    /// The task running the statement panicked or was cancelled.
    #[error("Statement task failed: {0}")]
    Task(String),
}

impl DbError {
    /// The driver's own message, without the variant prefix.
    pub fn diagnostic(&self) -> String {
        match self {
            DbError::Statement { message, .. } => message.clone(),
            DbError::PgError(err) => err.to_string(),
            other => other.to_string(),
        }
    }

    /// Whether the failure means the session itself is unusable.
    pub fn is_connection_loss(&self) -> bool {
        match self {
            DbError::Closed | DbError::NotConnected => true,
            DbError::PgError(err) => err.is_closed(),
            _ => false,
        }
    }
}

impl From<tokio_postgres::Error> for DbError {
    fn from(err: tokio_postgres::Error) -> Self {
        if err.is_closed() {
            return DbError::Closed;
        }

        if let Some(db_err) = err.as_db_error() {
            return DbError::Statement {
                code: Some(db_err.code().code().to_string()),
                message: db_err.message().to_string(),
            };
        }

        DbError::PgError(err)
    }
}

/// Errors happening during connection setup.
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("Invalid connection settings: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("Postgres connection failed: {0}")]
    Connection(#[from] tokio_postgres::Error),

    #[error("TLS configuration error: {0}")]
    TlsConfig(#[from] native_tls::Error),

    /// The handshake finished without reaching a ready state.
    #[error("Handshake failed: {0}")]
    Handshake(String),

    #[error("Cannot enter non-blocking mode: {0}")]
    NonBlocking(String),
}

#[cfg(test)]
mod tests {
    use super::DbError;

    #[test]
    fn test_statement_error_display() {
        let err = DbError::Statement {
            code: Some("42P01".to_string()),
            message: "relation \"events\" does not exist".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Statement failed: relation \"events\" does not exist"
        );
        assert_eq!(err.diagnostic(), "relation \"events\" does not exist");
        assert!(!err.is_connection_loss());
    }

    #[test]
    fn test_connection_loss_classification() {
        assert!(DbError::Closed.is_connection_loss());
        assert!(DbError::NotConnected.is_connection_loss());
        assert!(!DbError::Blocking.is_connection_loss());
        assert!(!DbError::Task("cancelled".into()).is_connection_loss());
    }
}

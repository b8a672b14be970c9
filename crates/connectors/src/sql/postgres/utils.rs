use crate::sql::base::error::ConnectorError;
use model::execution::connection::{ConnectionConfig, SslMode};
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use tokio_postgres::{Client, Config, NoTls, config::SslMode as PgSslMode};
use tracing::{error, warn};

const APPLICATION_NAME: &str = "pgsink";

/// Translates sink settings into driver connection parameters.
pub(crate) fn pg_config(config: &ConnectionConfig) -> Result<Config, ConnectorError> {
    let mut pg = Config::new();
    pg.host(&config.host)
        .port(config.port_number()?)
        .dbname(&config.database)
        .application_name(APPLICATION_NAME);

    // libpq falls back to the OS account name when no user is given.
    let user = config
        .user
        .clone()
        .or_else(|| std::env::var("USER").ok())
        .or_else(|| std::env::var("USERNAME").ok())
        .unwrap_or_else(|| "postgres".to_string());
    pg.user(&user);

    if let Some(password) = &config.password {
        pg.password(password);
    }

    pg.ssl_mode(match config.ssl_mode {
        SslMode::Disable => PgSslMode::Disable,
        SslMode::Prefer => PgSslMode::Prefer,
        SslMode::Require => PgSslMode::Require,
    });

    Ok(pg)
}

pub(crate) async fn connect_client(config: Config) -> Result<Client, ConnectorError> {
    match config.get_ssl_mode() {
        PgSslMode::Disable => connect_without_tls(config).await,
        PgSslMode::Prefer => match connect_with_tls(config.clone()).await {
            Ok(client) => Ok(client),
            Err(error) => {
                warn!(%error, "Postgres TLS handshake failed, retrying without TLS");
                connect_without_tls(config).await
            }
        },
        _ => connect_with_tls(config).await,
    }
}

pub(crate) async fn connect_with_tls(config: Config) -> Result<Client, ConnectorError> {
    let connector = TlsConnector::builder().build()?;
    let tls = MakeTlsConnector::new(connector);
    let (client, connection) = config.connect(tls).await?;
    tokio::spawn(async move {
        if let Err(err) = connection.await {
            error!(%err, "Postgres connection error");
        }
    });
    Ok(client)
}

pub(crate) async fn connect_without_tls(config: Config) -> Result<Client, ConnectorError> {
    let (client, connection) = config.connect(NoTls).await?;
    tokio::spawn(async move {
        if let Err(err) = connection.await {
            error!(%err, "Postgres connection error");
        }
    });
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::pg_config;
    use crate::sql::base::error::ConnectorError;
    use model::execution::connection::{ConnectionConfig, SslMode};
    use tokio_postgres::config::{Host, SslMode as PgSslMode};

    #[test]
    fn test_pg_config_maps_settings() {
        let config = ConnectionConfig::new("db.local", "6543", "logs", "events")
            .with_credentials(Some("fluent".into()), Some("hunter2".into()))
            .with_ssl_mode(SslMode::Disable);

        let pg = pg_config(&config).unwrap();

        assert_eq!(pg.get_hosts(), &[Host::Tcp("db.local".to_string())]);
        assert_eq!(pg.get_ports(), &[6543]);
        assert_eq!(pg.get_dbname(), Some("logs"));
        assert_eq!(pg.get_user(), Some("fluent"));
        assert_eq!(pg.get_password(), Some("hunter2".as_bytes()));
        assert_eq!(pg.get_ssl_mode(), PgSslMode::Disable);
    }

    #[test]
    fn test_pg_config_rejects_bad_port() {
        let config = ConnectionConfig::new("db.local", "fivefourthreetwo", "logs", "events");
        assert!(matches!(
            pg_config(&config),
            Err(ConnectorError::InvalidConfig(_))
        ));
    }
}

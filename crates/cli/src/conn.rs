use crate::{commands::ConnArgs, env::EnvManager, error::CliError};
use model::execution::{connection::ConnectionConfig, properties::Properties};
use sink_core::{
    error::InitError,
    retry::{RetryDisposition, RetryError, RetryPolicy},
    sink::{Sink, postgres::PgSink},
};
use tracing::{info, warn};

/// Merges environment settings with command-line flags; flags win.
pub fn resolve_config(args: &ConnArgs, env: &EnvManager) -> Result<ConnectionConfig, CliError> {
    let mut props: Properties = env.properties();
    for (key, value) in args.properties() {
        props.insert(key, &value);
    }

    Ok(ConnectionConfig::from_properties(&props)?)
}

pub fn load_env(args: &ConnArgs) -> Result<EnvManager, CliError> {
    let mut env = EnvManager::new();
    if let Some(path) = &args.env_file {
        env.load_from_file(path)?;
    }
    Ok(env)
}

/// Starts the sink, retrying while the server refuses connections.
pub async fn open_sink(config: ConnectionConfig, policy: &RetryPolicy) -> Result<PgSink, CliError> {
    let result = policy
        .run(
            || PgSink::connect(config.clone()),
            |err: &InitError| {
                if err.is_transient() {
                    warn!(error = %err, "Sink start failed, retrying");
                    RetryDisposition::Retry
                } else {
                    RetryDisposition::Stop
                }
            },
        )
        .await;

    match result {
        Ok(sink) => Ok(sink),
        Err(RetryError::Fatal(err)) | Err(RetryError::AttemptsExceeded(err)) => Err(err.into()),
    }
}

pub async fn test_connection(config: ConnectionConfig) -> Result<(), CliError> {
    info!(
        host = %config.host,
        port = %config.port,
        dbname = %config.database,
        table = %config.table,
        "Testing connection"
    );

    let mut sink = PgSink::connect(config).await?;
    sink.exit().await;

    info!(table = %sink.table(), "Connection test succeeded");
    Ok(())
}

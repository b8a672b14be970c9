use model::execution::errors::ConfigError;
use sink_core::error::InitError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid connection settings: {0}")]
    Settings(#[from] ConfigError),

    #[error("Failed to start sink: {0}")]
    Init(#[from] InitError),

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    #[error("Shutdown requested")]
    ShutdownRequested,
}

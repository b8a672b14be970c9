use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("record must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("malformed record: {0}")]
    Json(#[from] serde_json::Error),
}

use serde::Serialize;
use std::fmt;

/// What the host should do with the batch it just handed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlushOutcome {
    /// Accepted; move on.
    Ok,
    /// Not written; hand the same batch over again later.
    Retry,
    /// Rejected for good; sending it again would fail the same way.
    Error,
}

impl fmt::Display for FlushOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlushOutcome::Ok => f.write_str("ok"),
            FlushOutcome::Retry => f.write_str("retry"),
            FlushOutcome::Error => f.write_str("error"),
        }
    }
}

pub mod postgres;

use crate::outcome::FlushOutcome;
use async_trait::async_trait;
use model::records::batch::Batch;

/// What a host pipeline drives: one flush per batch, then a single exit.
#[async_trait]
pub trait Sink: Send {
    async fn flush(&mut self, batch: &Batch) -> FlushOutcome;

    /// Drains outstanding work and releases the connection. Repeat calls are no-ops.
    async fn exit(&mut self);
}

pub mod encoder;
pub mod error;
pub mod flush;
pub mod metrics;
pub mod outcome;
pub mod retry;
pub mod sink;

#[cfg(test)]
mod tests;

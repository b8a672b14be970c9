pub mod connection;
pub mod error;
pub mod query;
pub mod session;

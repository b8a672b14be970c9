//! Defines the AST for the JSON array expansion INSERT.

use crate::query::ast::common::QuotedTable;

/// How the JSON document travels to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonPayload {
    /// Sent as a bound text parameter and cast to `json` server-side.
    Bound(String),
    /// Embedded in the statement text as a string literal.
    Literal(String),
}

impl JsonPayload {
    pub fn document(&self) -> &str {
        match self {
            JsonPayload::Bound(doc) | JsonPayload::Literal(doc) => doc,
        }
    }
}

/// `WITH <cte> AS (SELECT json_array_elements(<payload>) AS <column>)
/// INSERT INTO <table> (<column>) SELECT <column> FROM <cte>;`
///
/// Every element of the top-level array becomes one row.
#[derive(Debug, Clone)]
pub struct JsonArrayInsert {
    pub table: QuotedTable,
    pub column: String,
    pub cte: String,
    pub payload: JsonPayload,
}

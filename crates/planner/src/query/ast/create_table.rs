//! Defines the AST for a CREATE TABLE statement.

use crate::query::ast::common::QuotedTable;

/// Represents a complete CREATE TABLE statement.
#[derive(Debug, Clone)]
pub struct CreateTable {
    pub table: QuotedTable,
    pub columns: Vec<ColumnDef>,
    pub if_not_exists: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    /// Type name as the server spells it, e.g. `json`.
    pub data_type: String,
}

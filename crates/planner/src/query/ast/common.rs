use crate::query::dialect::Dialect;
use std::fmt;

/// A table name already escaped for one dialect. The configured name is
/// taken as a single identifier, dots included.
///
/// Built once when a sink starts and reused verbatim by every statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotedTable(String);

impl QuotedTable {
    pub fn new(dialect: &dyn Dialect, name: &str) -> Self {
        QuotedTable(dialect.quote_identifier(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuotedTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

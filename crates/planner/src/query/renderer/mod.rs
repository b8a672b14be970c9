//! Defines the core rendering trait and context for converting AST to SQL.

use crate::query::{Statement, ast::common::QuotedTable, dialect::Dialect};

pub mod create_table;
pub mod insert;

/// A trait for any AST node that can be rendered into a SQL string.
pub trait Render {
    fn render(&self, renderer: &mut Renderer);
}

/// A context that holds the state during the rendering process.
///
/// It accumulates the SQL string and the parameters, and provides
/// access to the dialect for syntax-specific details.
pub struct Renderer<'a> {
    pub sql: String,
    pub params: Vec<String>,
    pub dialect: &'a dyn Dialect,
}

impl<'a> Renderer<'a> {
    pub fn new(dialect: &'a dyn Dialect) -> Self {
        Self {
            sql: String::new(),
            params: Vec::new(),
            dialect,
        }
    }

    /// Consumes the renderer and returns the final statement.
    pub fn finish(self) -> Statement {
        Statement {
            sql: self.sql,
            params: self.params,
        }
    }

    pub fn add_param(&mut self, value: String) {
        self.params.push(value);
        let placeholder = self.dialect.get_placeholder(self.params.len() - 1);
        self.sql.push_str(&placeholder);
    }

    /// Tables arrive pre-quoted; they are never escaped again here.
    pub fn render_table(&mut self, table: &QuotedTable) {
        self.sql.push_str(table.as_str());
    }

    pub fn render_column(&mut self, column: &str) {
        let rendered = self.dialect.quote_identifier_if_needed(column);
        self.sql.push_str(&rendered);
    }
}

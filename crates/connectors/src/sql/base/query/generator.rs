use model::execution::connection::PayloadMode;
use planner::query::{
    Statement,
    ast::{
        common::QuotedTable,
        insert::JsonPayload,
    },
    builder::{create_table::CreateTableBuilder, insert::JsonInsertBuilder},
    dialect::Dialect,
    renderer::{Render, Renderer},
};

/// The single column every destination table carries.
pub const JSON_COLUMN: &str = "data";
pub const JSON_COLUMN_TYPE: &str = "json";

pub struct QueryGenerator<'a> {
    dialect: &'a dyn Dialect,
}

impl<'a> QueryGenerator<'a> {
    pub fn new(dialect: &'a dyn Dialect) -> Self {
        Self { dialect }
    }

    /// Escapes a configured table name once, for reuse by every statement.
    pub fn quote_table(&self, raw: &str) -> QuotedTable {
        QuotedTable::new(self.dialect, raw)
    }

    /// `CREATE TABLE IF NOT EXISTS <table> (data json);`
    pub fn create_json_table(&self, table: &QuotedTable) -> Statement {
        let ast = CreateTableBuilder::new(table.clone())
            .column(JSON_COLUMN, JSON_COLUMN_TYPE)
            .if_not_exists()
            .build();
        self.render_ast(&ast)
    }

    /// One INSERT that expands the top-level JSON array into one row per element.
    pub fn json_array_insert(
        &self,
        table: &QuotedTable,
        document: &str,
        mode: PayloadMode,
    ) -> Statement {
        let payload = match mode {
            PayloadMode::Bound => JsonPayload::Bound(document.to_string()),
            PayloadMode::Literal => JsonPayload::Literal(document.to_string()),
        };
        let ast = JsonInsertBuilder::new(table.clone(), payload)
            .column(JSON_COLUMN)
            .build();
        self.render_ast(&ast)
    }

    fn render_ast(&self, ast: &impl Render) -> Statement {
        let mut renderer = Renderer::new(self.dialect);
        ast.render(&mut renderer);
        renderer.finish()
    }
}

use crate::query::ast::{
    common::QuotedTable,
    insert::{JsonArrayInsert, JsonPayload},
};

#[derive(Debug, Clone)]
pub struct JsonInsertBuilder {
    ast: JsonArrayInsert,
}

impl JsonInsertBuilder {
    pub fn new(table: QuotedTable, payload: JsonPayload) -> Self {
        Self {
            ast: JsonArrayInsert {
                table,
                column: "data".to_string(),
                cte: "json_pack".to_string(),
                payload,
            },
        }
    }

    pub fn column(mut self, column: &str) -> Self {
        self.ast.column = column.to_string();
        self
    }

    pub fn build(self) -> JsonArrayInsert {
        self.ast
    }
}

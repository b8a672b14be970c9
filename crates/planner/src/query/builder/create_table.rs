use crate::query::ast::{
    common::QuotedTable,
    create_table::{ColumnDef, CreateTable},
};

#[derive(Debug, Clone)]
pub struct CreateTableBuilder {
    ast: CreateTable,
}

impl CreateTableBuilder {
    pub fn new(table: QuotedTable) -> Self {
        Self {
            ast: CreateTable {
                table,
                columns: Vec::new(),
                if_not_exists: false,
            },
        }
    }

    pub fn column(mut self, name: &str, data_type: &str) -> Self {
        self.ast.columns.push(ColumnDef {
            name: name.to_string(),
            data_type: data_type.to_string(),
        });
        self
    }

    pub fn if_not_exists(mut self) -> Self {
        self.ast.if_not_exists = true;
        self
    }

    pub fn build(self) -> CreateTable {
        self.ast
    }
}

#[cfg(test)]
mod tests {
    use crate::query::{
        ast::common::QuotedTable,
        builder::create_table::CreateTableBuilder,
        dialect::Postgres,
    };

    #[test]
    fn test_create_table_builder() {
        let table = QuotedTable::new(&Postgres, "events");
        let ast = CreateTableBuilder::new(table)
            .column("data", "json")
            .if_not_exists()
            .build();

        assert!(ast.if_not_exists);
        assert_eq!(ast.columns.len(), 1);
        assert_eq!(ast.columns[0].data_type, "json");
    }
}

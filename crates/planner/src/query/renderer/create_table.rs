use crate::query::{
    ast::create_table::CreateTable,
    renderer::{Render, Renderer},
};

impl Render for CreateTable {
    fn render(&self, r: &mut Renderer) {
        r.sql.push_str("CREATE TABLE ");
        if self.if_not_exists {
            r.sql.push_str("IF NOT EXISTS ");
        }
        r.render_table(&self.table);
        r.sql.push_str(" (");
        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                r.sql.push_str(", ");
            }
            r.render_column(&column.name);
            r.sql.push(' ');
            r.sql.push_str(&column.data_type);
        }
        r.sql.push_str(");");
    }
}

#[cfg(test)]
mod tests {
    use crate::query::{
        ast::{
            common::QuotedTable,
            create_table::{ColumnDef, CreateTable},
        },
        dialect::Postgres,
        renderer::{Render, Renderer},
    };

    #[test]
    fn test_render_create_table_if_not_exists() {
        let ast = CreateTable {
            table: QuotedTable::new(&Postgres, "events"),
            columns: vec![ColumnDef {
                name: "data".to_string(),
                data_type: "json".to_string(),
            }],
            if_not_exists: true,
        };

        let mut renderer = Renderer::new(&Postgres);
        ast.render(&mut renderer);
        let statement = renderer.finish();

        assert!(statement.params.is_empty());
        assert_eq!(
            statement.sql,
            r#"CREATE TABLE IF NOT EXISTS "events" (data json);"#
        );
    }

    #[test]
    fn test_render_create_table_quotes_unusual_columns() {
        let ast = CreateTable {
            table: QuotedTable::new(&Postgres, "Logs"),
            columns: vec![
                ColumnDef {
                    name: "Payload".to_string(),
                    data_type: "jsonb".to_string(),
                },
                ColumnDef {
                    name: "seq".to_string(),
                    data_type: "bigint".to_string(),
                },
            ],
            if_not_exists: false,
        };

        let mut renderer = Renderer::new(&Postgres);
        ast.render(&mut renderer);

        assert_eq!(
            renderer.finish().sql,
            r#"CREATE TABLE "Logs" ("Payload" jsonb, seq bigint);"#
        );
    }
}

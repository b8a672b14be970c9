use crate::query::{
    ast::insert::{JsonArrayInsert, JsonPayload},
    renderer::{Render, Renderer},
};

impl Render for JsonArrayInsert {
    fn render(&self, r: &mut Renderer) {
        // 1. WITH <cte> AS (SELECT json_array_elements(<payload>) AS <column>)
        r.sql.push_str("WITH ");
        r.render_column(&self.cte);
        r.sql.push_str(" AS (SELECT json_array_elements(");
        match &self.payload {
            JsonPayload::Bound(document) => {
                r.add_param(document.clone());
                r.sql.push_str("::text::json");
            }
            JsonPayload::Literal(document) => {
                let literal = r.dialect.quote_literal(document);
                r.sql.push_str(&literal);
            }
        }
        r.sql.push_str(") AS ");
        r.render_column(&self.column);
        r.sql.push_str(") ");

        // 2. INSERT INTO <table> (<column>) SELECT <column> FROM <cte>
        r.sql.push_str("INSERT INTO ");
        r.render_table(&self.table);
        r.sql.push_str(" (");
        r.render_column(&self.column);
        r.sql.push_str(") SELECT ");
        r.render_column(&self.column);
        r.sql.push_str(" FROM ");
        r.render_column(&self.cte);
        r.sql.push(';');
    }
}

//! SQL generation for the sink: dialect rules, statement ASTs, builders
//! and the renderer that turns them into text plus bound parameters.

pub mod ast;
pub mod builder;
pub mod dialect;
pub mod renderer;

/// A rendered SQL statement together with the values bound to its placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<String>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    pub fn is_parameterized(&self) -> bool {
        !self.params.is_empty()
    }
}

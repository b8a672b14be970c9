//! Defines the `Dialect` trait for database-specific SQL syntax.

pub trait Dialect: Send + Sync {
    /// Wraps an identifier (like a table or column name) in the correct
    /// quotation marks for the dialect, escaping any embedded quote.
    ///
    /// - PostgreSQL uses double quotes: `"my_column"`
    fn quote_identifier(&self, ident: &str) -> String;

    /// Returns the identifier unchanged when it is a plain lower-case name
    /// the server would not fold or misread, otherwise quotes it.
    fn quote_identifier_if_needed(&self, ident: &str) -> String {
        let mut chars = ident.chars();
        let plain = match chars.next() {
            Some(first) => {
                (first.is_ascii_lowercase() || first == '_')
                    && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
            }
            None => false,
        };

        if plain {
            ident.to_string()
        } else {
            self.quote_identifier(ident)
        }
    }

    /// Renders `value` as a string literal that the server reads back
    /// byte for byte.
    fn quote_literal(&self, value: &str) -> String;

    /// Returns the placeholder for a parameterized query.
    ///
    /// - PostgreSQL uses `$1`, `$2`, etc.
    fn get_placeholder(&self, index: usize) -> String;
}

#[derive(Debug, Clone)]
pub struct Postgres;

impl Dialect for Postgres {
    fn quote_identifier(&self, ident: &str) -> String {
        format!(r#""{}""#, ident.replace('"', r#""""#))
    }

    fn quote_literal(&self, value: &str) -> String {
        // Same rules as the server's quote_literal(): with a backslash present
        // the escape-string form is used so the result does not depend on
        // standard_conforming_strings.
        let escaped = value.replace('\'', "''");
        if escaped.contains('\\') {
            format!("E'{}'", escaped.replace('\\', r"\\"))
        } else {
            format!("'{escaped}'")
        }
    }

    fn get_placeholder(&self, index: usize) -> String {
        // PostgreSQL uses $1, $2, etc.
        format!("${}", index + 1)
    }
}

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use model::execution::properties::Properties;
use tracing::debug;

use crate::error::CliError;

pub const ENV_PREFIX: &str = "PGSINK_";

/// Environment variables from the process and optional .env files.
/// Later sources override earlier ones.
#[derive(Debug, Clone)]
pub struct EnvManager {
    vars: HashMap<String, String>,
    sensitive_patterns: Vec<String>,
}

impl EnvManager {
    pub fn new() -> Self {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I: IntoIterator<Item = (String, String)>>(vars: I) -> Self {
        Self {
            vars: vars.into_iter().collect(),
            sensitive_patterns: Self::default_sensitive_patterns(),
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), CliError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("Failed to read env file {}: {}", path.display(), e))
        })?;

        self.parse_env_content(&content)
    }

    /// `PGSINK_*` variables as sink properties, e.g. `PGSINK_TIME_KEY` becomes `time_key`.
    pub fn properties(&self) -> Properties {
        let mut props = Properties::new();
        for (key, value) in &self.vars {
            let Some(name) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            if name.is_empty() {
                continue;
            }

            if self.is_sensitive(name) {
                debug!(var = %key, "Using environment value (redacted)");
            } else {
                debug!(var = %key, value = %value, "Using environment value");
            }
            props.insert(name, value);
        }
        props
    }

    pub fn is_sensitive(&self, key: &str) -> bool {
        let key = key.to_lowercase();
        self.sensitive_patterns.iter().any(|p| key.contains(p))
    }

    fn parse_env_content(&mut self, content: &str) -> Result<(), CliError> {
        for (line_num, line) in content.lines().enumerate() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let line = line.strip_prefix("export ").unwrap_or(line);

            let Some((key, value)) = line.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid env file: malformed line {} (expected KEY=VALUE)",
                    line_num + 1
                )));
            };

            let key = key.trim();
            if key.is_empty() {
                return Err(CliError::Config(format!(
                    "Invalid env file: empty key at line {}",
                    line_num + 1
                )));
            }

            self.vars
                .insert(key.to_string(), Self::unquote_value(value));
        }

        Ok(())
    }

    fn unquote_value(value: &str) -> String {
        let value = value.trim();

        for quote in ['"', '\''] {
            if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
                return value[1..value.len() - 1].to_string();
            }
        }

        value.to_string()
    }

    fn default_sensitive_patterns() -> Vec<String> {
        ["password", "passwd", "secret", "token", "credential"]
            .into_iter()
            .map(String::from)
            .collect()
    }
}

impl Default for EnvManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty() -> EnvManager {
        EnvManager::from_vars(Vec::new())
    }

    impl EnvManager {
        fn get(&self, key: &str) -> Option<&str> {
            self.vars.get(key).map(String::as_str)
        }
    }

    #[test]
    fn test_parse_basic_env() {
        let mut env = empty();
        let content = r#"
# Comment
PGSINK_HOST=db.local
export PGSINK_PORT=6543
        "#;

        env.parse_env_content(content).unwrap();
        assert_eq!(env.get("PGSINK_HOST"), Some("db.local"));
        assert_eq!(env.get("PGSINK_PORT"), Some("6543"));
    }

    #[test]
    fn test_parse_quoted_values() {
        let mut env = empty();
        let content = r#"
QUOTED="value with spaces"
SINGLE='single quoted'
UNQUOTED=no_spaces
EQUALS=a=b
        "#;

        env.parse_env_content(content).unwrap();
        assert_eq!(env.get("QUOTED"), Some("value with spaces"));
        assert_eq!(env.get("SINGLE"), Some("single quoted"));
        assert_eq!(env.get("UNQUOTED"), Some("no_spaces"));
        assert_eq!(env.get("EQUALS"), Some("a=b"));
    }

    #[test]
    fn test_invalid_env_format() {
        let mut env = empty();
        assert!(env.parse_env_content("INVALID LINE WITHOUT EQUALS").is_err());
        assert!(env.parse_env_content("=value").is_err());
    }

    #[test]
    fn test_properties_only_take_prefixed_vars() {
        let env = EnvManager::from_vars(vec![
            ("PGSINK_HOST".to_string(), "db.local".to_string()),
            ("PGSINK_TIME_KEY".to_string(), "ts".to_string()),
            ("PGSINK_".to_string(), "ignored".to_string()),
            ("HOST".to_string(), "elsewhere".to_string()),
        ]);

        let props = env.properties();
        assert_eq!(props.len(), 2);
        assert_eq!(props.get("host"), Some("db.local"));
        assert_eq!(props.get("time_key"), Some("ts"));
    }

    #[test]
    fn test_sensitive_detection() {
        let env = empty();
        assert!(env.is_sensitive("PASSWORD"));
        assert!(env.is_sensitive("passwd"));
        assert!(!env.is_sensitive("HOST"));
    }
}

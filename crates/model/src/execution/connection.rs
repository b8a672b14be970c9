use crate::execution::{errors::ConfigError, properties::Properties};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr, time::Duration};
use tracing::warn;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: &str = "5432";
pub const DEFAULT_DATABASE: &str = "fluentbit";
pub const DEFAULT_TABLE: &str = "fluentbit";
pub const DEFAULT_TIME_KEY: &str = "date";

const KNOWN_PROPERTIES: &[&str] = &[
    "host",
    "port",
    "database",
    "dbname",
    "table",
    "user",
    "passwd",
    "password",
    "time_key",
    "ssl_mode",
    "sslmode",
    "payload",
    "result_wait_ms",
];

/// TLS negotiation, mirroring libpq's `sslmode` values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SslMode {
    Disable,
    #[default]
    Prefer,
    Require,
}

impl FromStr for SslMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "disable" => Ok(SslMode::Disable),
            "prefer" => Ok(SslMode::Prefer),
            "require" => Ok(SslMode::Require),
            other => Err(format!("unknown ssl mode: {other}")),
        }
    }
}

/// How a batch's JSON document is attached to the INSERT statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadMode {
    /// Bound as a statement parameter.
    #[default]
    Bound,
    /// Embedded in the statement text as an escaped string literal.
    Literal,
}

impl FromStr for PayloadMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bound" | "param" | "parameter" => Ok(PayloadMode::Bound),
            "literal" | "inline" => Ok(PayloadMode::Literal),
            other => Err(format!("unknown payload mode: {other}")),
        }
    }
}

/// Everything a sink needs to reach its destination table.
///
/// The port stays textual, as the driver's key/value connection parameters
/// expect; it is validated when the connection is opened.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: String,
    pub database: String,
    pub table: String,
    pub user: Option<String>,
    #[serde(alias = "passwd", skip_serializing)]
    pub password: Option<String>,
    pub time_key: String,
    pub ssl_mode: SslMode,
    pub payload: PayloadMode,
    /// Upper bound on how long a flush waits for its own statement result.
    /// Unset means results are collected by later cycles.
    pub result_wait_ms: Option<u64>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.into(),
            port: DEFAULT_PORT.into(),
            database: DEFAULT_DATABASE.into(),
            table: DEFAULT_TABLE.into(),
            user: None,
            password: None,
            time_key: DEFAULT_TIME_KEY.into(),
            ssl_mode: SslMode::default(),
            payload: PayloadMode::default(),
            result_wait_ms: None,
        }
    }
}

impl ConnectionConfig {
    pub fn new(host: &str, port: &str, database: &str, table: &str) -> Self {
        Self {
            host: host.to_string(),
            port: port.to_string(),
            database: database.to_string(),
            table: table.to_string(),
            ..Default::default()
        }
    }

    pub fn with_credentials(mut self, user: Option<String>, password: Option<String>) -> Self {
        self.user = user;
        self.password = password;
        self
    }

    pub fn with_time_key(mut self, time_key: &str) -> Self {
        self.time_key = time_key.to_string();
        self
    }

    pub fn with_ssl_mode(mut self, ssl_mode: SslMode) -> Self {
        self.ssl_mode = ssl_mode;
        self
    }

    pub fn with_payload(mut self, payload: PayloadMode) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_result_wait(mut self, wait: Duration) -> Self {
        self.result_wait_ms = Some(u64::try_from(wait.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Builds a config from host-supplied properties, falling back to the
    /// defaults for anything missing.
    pub fn from_properties(props: &Properties) -> Result<Self, ConfigError> {
        for key in props.keys() {
            if !KNOWN_PROPERTIES.contains(&key) {
                warn!(property = %key, "Ignoring unknown property");
            }
        }

        let mut config = ConnectionConfig::default();

        if let Some(host) = props.get("host") {
            config.host = host.to_string();
        }
        if let Some(port) = props.get("port") {
            config.port = port.to_string();
        }
        if let Some(database) = props.get_any(&["database", "dbname"]) {
            config.database = database.to_string();
        }
        if let Some(table) = props.get("table") {
            config.table = table.to_string();
        }
        if let Some(time_key) = props.get("time_key") {
            config.time_key = time_key.to_string();
        }

        config.user = props.get("user").map(str::to_string);
        config.password = props.get_any(&["passwd", "password"]).map(str::to_string);

        if let Some(raw) = props.get_any(&["ssl_mode", "sslmode"]) {
            config.ssl_mode = raw
                .parse()
                .map_err(|reason: String| ConfigError::invalid("ssl_mode", raw, reason))?;
        }
        if let Some(raw) = props.get("payload") {
            config.payload = raw
                .parse()
                .map_err(|reason: String| ConfigError::invalid("payload", raw, reason))?;
        }
        if let Some(raw) = props.get("result_wait_ms") {
            let ms = raw
                .parse::<u64>()
                .map_err(|e| ConfigError::invalid("result_wait_ms", raw, e.to_string()))?;
            config.result_wait_ms = Some(ms);
        }

        Ok(config)
    }

    /// Replaces blank fields with their defaults.
    pub fn with_defaults(mut self) -> Self {
        fn fill(field: &mut String, default: &str) {
            if field.trim().is_empty() {
                *field = default.to_string();
            }
        }

        fill(&mut self.host, DEFAULT_HOST);
        fill(&mut self.port, DEFAULT_PORT);
        fill(&mut self.database, DEFAULT_DATABASE);
        fill(&mut self.table, DEFAULT_TABLE);
        fill(&mut self.time_key, DEFAULT_TIME_KEY);
        self
    }

    pub fn port_number(&self) -> Result<u16, ConfigError> {
        match self.port.trim().parse::<u16>() {
            Ok(0) => Err(ConfigError::invalid("port", &self.port, "port must be non-zero")),
            Ok(port) => Ok(port),
            Err(e) => Err(ConfigError::invalid("port", &self.port, e.to_string())),
        }
    }

    pub fn result_wait(&self) -> Option<Duration> {
        self.result_wait_ms.map(Duration::from_millis)
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("table", &self.table)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("time_key", &self.time_key)
            .field("ssl_mode", &self.ssl_mode)
            .field("payload", &self.payload)
            .field("result_wait_ms", &self.result_wait_ms)
            .finish()
    }
}

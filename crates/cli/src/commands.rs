use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Read newline-delimited JSON records and write them to PostgreSQL in batches
    Ship {
        #[arg(long, help = "Input file; reads stdin when omitted")]
        input: Option<PathBuf>,

        #[arg(long, default_value_t = 500, help = "Records per flushed batch")]
        batch_size: usize,

        #[arg(long, default_value = "pgsink", help = "Tag attached to every batch")]
        tag: String,

        #[arg(
            long,
            default_value_t = 8,
            help = "Deliveries of one batch before it is abandoned while the database is unreachable"
        )]
        max_attempts: usize,

        #[arg(
            long,
            help = "If specified, writes the JSON summary to this file instead of stdout"
        )]
        report: Option<PathBuf>,

        #[command(flatten)]
        conn: ConnArgs,
    },
    /// Connect, ensure the destination table exists and disconnect
    TestConn {
        #[command(flatten)]
        conn: ConnArgs,
    },
}

/// Connection flags. Anything left unset falls back to `PGSINK_*` variables.
#[derive(Args, Debug, Clone, Default)]
pub struct ConnArgs {
    #[arg(long)]
    pub host: Option<String>,

    #[arg(long)]
    pub port: Option<String>,

    #[arg(long)]
    pub database: Option<String>,

    #[arg(long)]
    pub table: Option<String>,

    #[arg(long)]
    pub user: Option<String>,

    #[arg(long)]
    pub password: Option<String>,

    #[arg(long, help = "Field the record timestamp is written under")]
    pub time_key: Option<String>,

    #[arg(long, help = "disable, prefer or require")]
    pub ssl_mode: Option<String>,

    #[arg(long, help = "bound or literal")]
    pub payload: Option<String>,

    #[arg(long, help = "Milliseconds a flush waits for its own result")]
    pub result_wait_ms: Option<u64>,

    #[arg(long, help = "Load PGSINK_* variables from this .env file")]
    pub env_file: Option<PathBuf>,
}

impl ConnArgs {
    /// Flags that were given, as property name/value pairs.
    pub fn properties(&self) -> Vec<(&'static str, String)> {
        let mut props = Vec::new();
        let mut push = |key: &'static str, value: &Option<String>| {
            if let Some(value) = value {
                props.push((key, value.clone()));
            }
        };

        push("host", &self.host);
        push("port", &self.port);
        push("database", &self.database);
        push("table", &self.table);
        push("user", &self.user);
        push("password", &self.password);
        push("time_key", &self.time_key);
        push("ssl_mode", &self.ssl_mode);
        push("payload", &self.payload);
        push("result_wait_ms", &self.result_wait_ms.map(|ms| ms.to_string()));
        props
    }
}

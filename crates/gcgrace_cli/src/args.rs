use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::executor::ExecutorOptions;
use crate::format::OutputMode;

/// gcgrace: apply compaction and gc_grace_seconds settings to a keyspace
#[derive(Debug, Parser)]
#[command(
    name = "gcgrace",
    about = "Plan and apply compaction / gc_grace_seconds alterations on a Cassandra keyspace",
    version
)]
pub struct Args {
    /// Descriptor file (TOML, or JSON with a .json extension). Defaults to
    /// the embedded descriptor.
    #[arg(short = 'f', long, value_name = "PATH")]
    pub descriptor: Option<PathBuf>,

    /// Keyspace to alter (overrides the descriptor's keyspace)
    #[arg(short = 'k', long, env = "CASSANDRA_KEYSPACE")]
    pub keyspace: Option<String>,

    /// Contact points, comma separated
    #[arg(
        short = 'H',
        long,
        env = "CASSANDRA_HOSTS",
        value_delimiter = ',',
        default_value = "127.0.0.1:9042"
    )]
    pub hosts: Vec<String>,

    /// Database user
    #[arg(short = 'U', long, env = "CASSANDRA_USER")]
    pub user: Option<String>,

    /// Password (use CASSANDRA_PASSWORD to keep it out of the process list)
    #[arg(short = 'W', long, env = "CASSANDRA_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Connection timeout in milliseconds
    #[arg(long, default_value_t = 5_000)]
    pub connect_timeout_ms: u64,

    /// Per-statement timeout in milliseconds (0 = no timeout)
    #[arg(long, default_value_t = 30_000)]
    pub statement_timeout_ms: u64,

    /// Retries per table for connection errors and timeouts
    #[arg(long, default_value_t = 0)]
    pub retries: u32,

    /// Back-off between retries in milliseconds, multiplied by the attempt number
    #[arg(long, default_value_t = 500)]
    pub retry_backoff_ms: u64,

    /// Send every statement even when the table already has the target settings
    #[arg(long)]
    pub force: bool,

    /// Execute the alterations (default is plan-only)
    #[arg(long)]
    pub apply: bool,

    /// Skip interactive confirmation prompt (use with --apply)
    #[arg(long)]
    pub yes: bool,

    /// JSON output for plans and reports
    #[arg(long)]
    pub json: bool,

    /// Print the descriptor as a CQL script and exit
    #[arg(long, conflicts_with = "apply")]
    pub script: bool,

    /// Print the embedded default descriptor as TOML and exit
    #[arg(long)]
    pub print_default_descriptor: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Table
        }
    }

    /// Log filter used when RUST_LOG is not set.
    pub fn default_log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }

    pub fn executor_options(&self) -> ExecutorOptions {
        ExecutorOptions {
            statement_timeout: (self.statement_timeout_ms > 0)
                .then(|| Duration::from_millis(self.statement_timeout_ms)),
            retries: self.retries,
            retry_backoff: Duration::from_millis(self.retry_backoff_ms),
            force: self.force,
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

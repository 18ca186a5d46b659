use serde_json::{json, Value};

use crate::apply::{ExecutionResult, Outcome, SkipReason};
use crate::format::{tables, OutputMode};

/// Process exit codes.
pub const EXIT_OK: i32 = 0;
pub const EXIT_FATAL: i32 = 1;
pub const EXIT_PARTIAL_FAILURE: i32 = 2;
pub const EXIT_INTERRUPTED: i32 = 3;

/// Summary of one run, built from the executor's ordered results.
#[derive(Debug, Clone)]
pub struct Report {
    pub keyspace: String,
    pub results: Vec<ExecutionResult>,
}

impl Report {
    pub fn new(keyspace: impl Into<String>, results: Vec<ExecutionResult>) -> Self {
        Self {
            keyspace: keyspace.into(),
            results,
        }
    }

    pub fn applied(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Applied))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed))
    }

    /// Tables left untouched because the run was cancelled.
    pub fn cancelled(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped(SkipReason::Cancelled)))
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.results.iter().filter(|r| pred(&r.outcome)).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ExecutionResult> {
        self.results.iter().filter(|r| r.outcome == Outcome::Failed)
    }

    /// Zero only when every table was applied or already up to date.
    pub fn exit_code(&self) -> i32 {
        if self.failed() > 0 {
            EXIT_PARTIAL_FAILURE
        } else if self.cancelled() > 0 {
            EXIT_INTERRUPTED
        } else {
            EXIT_OK
        }
    }

    pub fn render(&self, mode: OutputMode) -> String {
        match mode {
            OutputMode::Json => self.render_json(),
            OutputMode::Table => self.render_table(),
        }
    }

    fn render_table(&self) -> String {
        let mut out = String::new();

        out.push_str(&format!(
            "╔══ REPORT: keyspace {} ({}) ══\n",
            self.keyspace,
            tables(self.results.len())
        ));
        for r in &self.results {
            out.push_str("  ");
            out.push_str(&r.render());
        }
        out.push_str(&format!(
            "  Applied : {}\n  Skipped : {}\n  Failed  : {}\n",
            self.applied(),
            self.skipped(),
            self.failed()
        ));

        let failures: Vec<&ExecutionResult> = self.failures().collect();
        if !failures.is_empty() {
            out.push_str("  Failure details:\n");
            for r in failures {
                out.push_str(&format!(
                    "    {} ({} attempt{}): {}\n      {}\n",
                    r.table_name,
                    r.attempts,
                    if r.attempts == 1 { "" } else { "s" },
                    r.error_detail.as_deref().unwrap_or("unknown error"),
                    r.statement
                ));
            }
            out.push_str("╚══ FAILED: re-run to retry the failed tables ══\n");
        } else if self.cancelled() > 0 {
            out.push_str(&format!(
                "╚══ INTERRUPTED: {} not altered, re-run to finish ══\n",
                tables(self.cancelled())
            ));
        } else {
            out.push_str("╚══ OK ══\n");
        }

        out
    }

    fn render_json(&self) -> String {
        let results: Vec<Value> = self.results.iter().map(|r| r.to_json()).collect();
        let v = json!({
            "report": {
                "keyspace": self.keyspace,
                "applied": self.applied(),
                "skipped": self.skipped(),
                "failed": self.failed(),
                "cancelled": self.cancelled(),
                "exit_code": self.exit_code(),
                "results": results,
            }
        });
        let mut s = serde_json::to_string_pretty(&v).unwrap_or_default();
        s.push('\n');
        s
    }
}

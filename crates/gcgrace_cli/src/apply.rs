use std::io::IsTerminal;

use anyhow::{bail, Result};
use gcgrace_common::ApplyError;
use serde_json::{json, Value};

use crate::timing::format_ms;

/// Why a table was left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Current compaction and gc_grace settings already match.
    UpToDate,
    /// The run was cancelled before this table was reached.
    Cancelled,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UpToDate => "already up to date",
            Self::Cancelled => "run cancelled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Skipped(SkipReason),
    Failed,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Skipped(_) => "skipped",
            Self::Failed => "failed",
        }
    }
}

/// Result of one table's alteration. `error_detail` is set exactly when the
/// outcome is `Failed`.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub table_name: String,
    pub statement: String,
    pub outcome: Outcome,
    pub error_detail: Option<String>,
    pub elapsed_ms: f64,
    pub attempts: u32,
}

impl ExecutionResult {
    pub fn applied(table: impl Into<String>, statement: impl Into<String>) -> Self {
        Self {
            table_name: table.into(),
            statement: statement.into(),
            outcome: Outcome::Applied,
            error_detail: None,
            elapsed_ms: 0.0,
            attempts: 1,
        }
    }

    pub fn skipped(
        table: impl Into<String>,
        statement: impl Into<String>,
        reason: SkipReason,
    ) -> Self {
        Self {
            table_name: table.into(),
            statement: statement.into(),
            outcome: Outcome::Skipped(reason),
            error_detail: None,
            elapsed_ms: 0.0,
            attempts: 0,
        }
    }

    pub fn failed(table: impl Into<String>, statement: impl Into<String>, error: &ApplyError) -> Self {
        Self {
            table_name: table.into(),
            statement: statement.into(),
            outcome: Outcome::Failed,
            error_detail: Some(error.to_string()),
            elapsed_ms: 0.0,
            attempts: 1,
        }
    }

    pub fn with_timing(mut self, elapsed_ms: f64, attempts: u32) -> Self {
        self.elapsed_ms = elapsed_ms;
        self.attempts = attempts;
        self
    }

    pub fn render(&self) -> String {
        let detail = match (&self.outcome, &self.error_detail) {
            (Outcome::Skipped(reason), _) => reason.as_str().to_string(),
            (_, Some(e)) => e.clone(),
            _ => format_ms(self.elapsed_ms),
        };
        format!(
            "[{}] {} - {}\n",
            self.outcome.as_str().to_uppercase(),
            self.table_name,
            detail
        )
    }

    pub fn to_json(&self) -> Value {
        let skip_reason = match self.outcome {
            Outcome::Skipped(reason) => Some(reason.as_str()),
            _ => None,
        };
        json!({
            "table": self.table_name,
            "statement": self.statement,
            "outcome": self.outcome.as_str(),
            "skip_reason": skip_reason,
            "error_detail": self.error_detail,
            "elapsed_ms": self.elapsed_ms,
            "attempts": self.attempts,
        })
    }
}

/// Guard: prompt for confirmation unless --yes was passed.
/// In non-interactive (piped) mode, always requires --yes.
pub fn confirm(yes: bool, prompt: &str) -> Result<bool> {
    if yes {
        return Ok(true);
    }

    if !std::io::stdin().is_terminal() {
        bail!("Non-interactive mode: use --yes to apply alterations without a prompt.");
    }

    eprint!("{} [y/N] ", prompt);
    let mut input = String::new();
    std::io::stdin()
        .read_line(&mut input)
        .map_err(|e| anyhow::anyhow!("Failed to read confirmation: {}", e))?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_confirm_yes_skips_prompt() {
        assert!(confirm(true, "Alter 7 tables?").unwrap());
    }

    #[test]
    fn test_result_render_applied() {
        let r = ExecutionResult::applied("locks", "ALTER TABLE otter.locks ...")
            .with_timing(12.5, 1);
        let out = r.render();
        assert!(out.contains("APPLIED"));
        assert!(out.contains("locks"));
        assert!(out.contains("12.500 ms"));
    }

    #[test]
    fn test_result_render_skipped_shows_reason() {
        let r = ExecutionResult::skipped("servers", "ALTER ...", SkipReason::Cancelled);
        let out = r.render();
        assert!(out.contains("SKIPPED"));
        assert!(out.contains("run cancelled"));
        assert!(r.error_detail.is_none());
    }

    #[test]
    fn test_result_failed_carries_detail() {
        let r = ExecutionResult::failed(
            "locks",
            "ALTER ...",
            &ApplyError::Timeout(Duration::from_millis(250)),
        );
        assert_eq!(r.outcome, Outcome::Failed);
        assert_eq!(
            r.error_detail.as_deref(),
            Some("statement timed out after 250ms")
        );
        assert!(r.render().contains("FAILED"));
    }

    #[test]
    fn test_result_json_shape() {
        let r = ExecutionResult::skipped("locks", "ALTER ...", SkipReason::UpToDate);
        let v = r.to_json();
        assert_eq!(v["outcome"], "skipped");
        assert_eq!(v["skip_reason"], "already up to date");
        assert!(v["error_detail"].is_null());
    }

    #[test]
    fn test_outcome_as_str() {
        assert_eq!(Outcome::Applied.as_str(), "applied");
        assert_eq!(Outcome::Skipped(SkipReason::UpToDate).as_str(), "skipped");
        assert_eq!(Outcome::Failed.as_str(), "failed");
    }
}

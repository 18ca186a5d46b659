//! Sequential application of a descriptor against a schema session.
//!
//! Tables are altered one at a time, in declaration order. A table's failure
//! is recorded on its result and the run moves on; only cancellation stops
//! new statements from being sent, and the tables it leaves behind are
//! reported as skipped.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use gcgrace_common::statement;
use gcgrace_common::{ApplyError, Descriptor, TableAlteration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::apply::{ExecutionResult, SkipReason};
use crate::timing::Timer;

/// Compaction settings Cassandra always stores, with their defaults. An
/// alteration that does not name one of these resets it to the default.
const IMPLICIT_DEFAULTS: [(&str, &str); 1] = [("max_threshold", "32")];

/// Table settings as currently stored in `system_schema.tables`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentSettings {
    pub compaction: HashMap<String, String>,
    pub gc_grace_seconds: i32,
}

impl CurrentSettings {
    /// True when applying `alteration` would leave the table unchanged.
    pub fn matches(&self, alteration: &TableAlteration) -> bool {
        if i64::from(self.gc_grace_seconds) != i64::from(alteration.gc_grace_seconds()) {
            return false;
        }

        let class_matches = self.compaction.get("class").is_some_and(|c| {
            c == alteration.compaction_class().as_str()
                || *c == alteration.compaction_class().qualified_name()
        });
        if !class_matches {
            return false;
        }

        let wanted: HashMap<&str, String> = alteration.compaction_options().into_iter().collect();
        let all_wanted_present = wanted
            .iter()
            .all(|(k, v)| self.compaction.get(*k) == Some(v));
        let no_stray_options = self.compaction.iter().all(|(k, v)| {
            k == "class"
                || wanted.contains_key(k.as_str())
                || IMPLICIT_DEFAULTS.iter().any(|(dk, dv)| k == dk && v == dv)
        });
        all_wanted_present && no_stray_options
    }
}

/// The executor's view of a live cluster.
#[async_trait]
pub trait SchemaSession: Send + Sync {
    /// Current settings of `keyspace.table`, or `None` if the table does not
    /// exist.
    async fn describe(&self, keyspace: &str, table: &str)
        -> Result<Option<CurrentSettings>, ApplyError>;

    /// Send one schema statement and wait for the acknowledgment.
    async fn execute(&self, statement: &str) -> Result<(), ApplyError>;
}

#[derive(Debug, Clone)]
pub struct ExecutorOptions {
    /// Per-request limit; `None` waits for the driver's own timeout.
    pub statement_timeout: Option<Duration>,
    /// Extra attempts for transient failures.
    pub retries: u32,
    /// Linear back-off unit between attempts.
    pub retry_backoff: Duration,
    /// Skip the up-to-date check.
    pub force: bool,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            statement_timeout: Some(Duration::from_secs(30)),
            retries: 0,
            retry_backoff: Duration::from_millis(500),
            force: false,
        }
    }
}

/// Apply every alteration of `descriptor`, in order. Always returns exactly
/// one result per alteration.
pub async fn apply_all<S>(
    session: &S,
    descriptor: &Descriptor,
    opts: &ExecutorOptions,
    cancel: &CancellationToken,
) -> Vec<ExecutionResult>
where
    S: SchemaSession + ?Sized,
{
    let keyspace = descriptor.keyspace();
    let mut results = Vec::with_capacity(descriptor.len());

    for alteration in descriptor.alterations() {
        let stmt = statement::render(keyspace, alteration);
        let table = alteration.table_name();

        if cancel.is_cancelled() {
            debug!("Skipping {}.{}: run cancelled", keyspace, table);
            results.push(ExecutionResult::skipped(table, stmt, SkipReason::Cancelled));
            continue;
        }

        let result = apply_one(session, keyspace, alteration, stmt, opts, cancel).await;
        match &result.error_detail {
            Some(e) => warn!("{}.{} failed: {}", keyspace, table, e),
            None => info!("{}.{} {}", keyspace, table, result.outcome.as_str()),
        }
        results.push(result);
    }

    results
}

async fn apply_one<S>(
    session: &S,
    keyspace: &str,
    alteration: &TableAlteration,
    stmt: String,
    opts: &ExecutorOptions,
    cancel: &CancellationToken,
) -> ExecutionResult
where
    S: SchemaSession + ?Sized,
{
    let table = alteration.table_name();
    let timer = Timer::start();

    if !opts.force {
        match with_timeout(opts.statement_timeout, session.describe(keyspace, table)).await {
            Ok(Some(current)) if current.matches(alteration) => {
                return ExecutionResult::skipped(table, stmt, SkipReason::UpToDate)
                    .with_timing(timer.elapsed_ms(), 0);
            }
            Ok(Some(current)) => {
                debug!("{}.{} current settings: {:?}", keyspace, table, current);
            }
            Ok(None) => {
                let err = ApplyError::Rejected(format!(
                    "table {}.{} does not exist",
                    keyspace, table
                ));
                return ExecutionResult::failed(table, stmt, &err)
                    .with_timing(timer.elapsed_ms(), 0);
            }
            Err(e) => {
                warn!(
                    "Could not read current settings of {}.{} ({}), altering anyway",
                    keyspace, table, e
                );
            }
        }
    }

    if cancel.is_cancelled() {
        debug!("Skipping {}.{}: run cancelled during pre-check", keyspace, table);
        return ExecutionResult::skipped(table, stmt, SkipReason::Cancelled)
            .with_timing(timer.elapsed_ms(), 0);
    }

    let mut attempt = 0;
    loop {
        attempt += 1;
        debug!("{}.{} attempt {}: {}", keyspace, table, attempt, stmt);

        match with_timeout(opts.statement_timeout, session.execute(&stmt)).await {
            Ok(()) => {
                return ExecutionResult::applied(table, stmt)
                    .with_timing(timer.elapsed_ms(), attempt);
            }
            Err(e) if e.is_retryable() && attempt <= opts.retries => {
                let backoff = opts.retry_backoff * attempt;
                warn!(
                    "{}.{} attempt {} failed ({}), retrying in {}ms",
                    keyspace,
                    table,
                    attempt,
                    e,
                    backoff.as_millis()
                );
                tokio::select! {
                    _ = tokio::time::sleep(backoff) => {}
                    _ = cancel.cancelled() => {
                        return ExecutionResult::failed(table, stmt, &e)
                            .with_timing(timer.elapsed_ms(), attempt);
                    }
                }
            }
            Err(e) => {
                return ExecutionResult::failed(table, stmt, &e)
                    .with_timing(timer.elapsed_ms(), attempt);
            }
        }
    }
}

/// Results for a run that never reached the cluster: every alteration is
/// failed with the same error, in declaration order.
pub fn fail_all(descriptor: &Descriptor, err: &ApplyError) -> Vec<ExecutionResult> {
    descriptor
        .alterations()
        .iter()
        .map(|a| {
            ExecutionResult::failed(
                a.table_name(),
                statement::render(descriptor.keyspace(), a),
                err,
            )
        })
        .collect()
}

async fn with_timeout<T, F>(limit: Option<Duration>, fut: F) -> Result<T, ApplyError>
where
    F: Future<Output = Result<T, ApplyError>>,
{
    match limit {
        Some(d) => tokio::time::timeout(d, fut)
            .await
            .unwrap_or(Err(ApplyError::Timeout(d))),
        None => fut.await,
    }
}

use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use gcgrace_common::ApplyError;
use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;
use scylla::errors::{DbError, ExecutionError, RequestAttemptError};
use tracing::debug;

use crate::args::Args;
use crate::executor::{CurrentSettings, SchemaSession};

const DESCRIBE_TABLE: &str = "SELECT compaction, gc_grace_seconds FROM system_schema.tables \
                              WHERE keyspace_name = ? AND table_name = ?";

/// CQL session against the target cluster.
pub struct CqlClient {
    session: Session,
    pub hosts: Vec<String>,
}

impl CqlClient {
    /// Connect using the provided args.
    pub async fn connect(args: &Args) -> Result<Self> {
        debug!(
            "Connecting: hosts={} user={}",
            args.hosts.join(","),
            args.user.as_deref().unwrap_or("<none>")
        );

        let mut builder = SessionBuilder::new()
            .known_nodes(&args.hosts)
            .connection_timeout(args.connect_timeout());
        if let Some(user) = &args.user {
            builder = builder.user(user.as_str(), args.password.as_deref().unwrap_or(""));
        }

        let session = builder
            .build()
            .await
            .with_context(|| format!("Failed to connect to {}", args.hosts.join(",")))?;

        Ok(Self {
            session,
            hosts: args.hosts.clone(),
        })
    }
}

#[async_trait]
impl SchemaSession for CqlClient {
    async fn describe(
        &self,
        keyspace: &str,
        table: &str,
    ) -> Result<Option<CurrentSettings>, ApplyError> {
        let result = self
            .session
            .query_unpaged(DESCRIBE_TABLE, (keyspace, table))
            .await
            .map_err(classify)?;
        let rows = result
            .into_rows_result()
            .map_err(|e| ApplyError::Connection(format!("unexpected schema response: {}", e)))?;
        let mut iter = rows
            .rows::<(HashMap<String, String>, i32)>()
            .map_err(|e| ApplyError::Connection(format!("unexpected schema columns: {}", e)))?;

        match iter.next() {
            Some(row) => {
                let (compaction, gc_grace_seconds) = row.map_err(|e| {
                    ApplyError::Connection(format!("cannot decode schema row: {}", e))
                })?;
                Ok(Some(CurrentSettings {
                    compaction,
                    gc_grace_seconds,
                }))
            }
            None => Ok(None),
        }
    }

    async fn execute(&self, statement: &str) -> Result<(), ApplyError> {
        self.session
            .query_unpaged(statement, ())
            .await
            .map(|_| ())
            .map_err(classify)
    }
}

/// Map driver errors onto the retry classification: errors the coordinator
/// returned for the statement itself are rejections, everything else is a
/// connection problem.
fn classify(err: ExecutionError) -> ApplyError {
    match &err {
        ExecutionError::LastAttemptError(RequestAttemptError::DbError(db, msg))
            if is_rejection(db) =>
        {
            if msg.is_empty() {
                ApplyError::Rejected(db.to_string())
            } else {
                ApplyError::Rejected(msg.clone())
            }
        }
        ExecutionError::RequestTimeout(d) => ApplyError::Timeout(*d),
        _ => ApplyError::Connection(err.to_string()),
    }
}

fn is_rejection(db: &DbError) -> bool {
    matches!(
        db,
        DbError::SyntaxError
            | DbError::Invalid
            | DbError::ConfigError
            | DbError::Unauthorized
            | DbError::AlreadyExists { .. }
    )
}

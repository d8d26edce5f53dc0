//! In-memory [`Session`] that replays canned server replies.

use std::collections::VecDeque;
use std::future::Future;

use crate::error::{DataSourceError, ServerError};
use crate::postgres::{ColumnDescription, RawRows, ServerReply, Session, StatementKind};

#[derive(Debug, Clone)]
enum Outcome {
    Reply(ServerReply),
    Disconnect(String),
}

#[derive(Debug, Clone)]
struct Step {
    busy_polls: u32,
    outcome: Outcome,
}

/// A fake connection for driving the engine without a server.
///
/// Each submitted statement consumes the next scripted step. A step reports busy for its
/// configured number of checks, then yields its reply. Submitting past the end of the script
/// fails with `DataSourceError::Connection`.
///
/// ```
/// use pg_datasource::test_utils::ScriptedSession;
///
/// let session = ScriptedSession::new()
///     .reply(ScriptedSession::command(1))
///     .reply_after(2, ScriptedSession::rows(&[("id", "int4")], vec![vec![Some("7")]]));
/// assert!(session.sent().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct ScriptedSession {
    script: VecDeque<Step>,
    in_flight: Option<Step>,
    sent: Vec<(String, StatementKind)>,
    busy_checks: u32,
}

impl ScriptedSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply that is ready on the first busy check.
    #[must_use]
    pub fn reply(self, reply: ServerReply) -> Self {
        self.reply_after(0, reply)
    }

    /// Queue a reply that reports busy `busy_polls` times first.
    #[must_use]
    pub fn reply_after(mut self, busy_polls: u32, reply: ServerReply) -> Self {
        self.script.push_back(Step {
            busy_polls,
            outcome: Outcome::Reply(reply),
        });
        self
    }

    /// Queue a dropped connection: the statement is accepted but no reply ever arrives.
    #[must_use]
    pub fn disconnect(mut self, reason: &str) -> Self {
        self.script.push_back(Step {
            busy_polls: 0,
            outcome: Outcome::Disconnect(reason.to_string()),
        });
        self
    }

    #[must_use]
    pub fn command(affected_rows: u64) -> ServerReply {
        ServerReply::Command { affected_rows }
    }

    /// Rows in server text form; `columns` are `(name, type name)` pairs.
    #[must_use]
    pub fn rows(columns: &[(&str, &str)], rows: Vec<Vec<Option<&str>>>) -> ServerReply {
        ServerReply::Rows(RawRows {
            columns: columns
                .iter()
                .map(|(name, type_name)| ColumnDescription::new(*name, *type_name))
                .collect(),
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(|cell| cell.map(str::to_owned)).collect())
                .collect(),
        })
    }

    #[must_use]
    pub fn error(code: &str, message: &str) -> ServerReply {
        ServerReply::Error(ServerError::new(code, message))
    }

    /// SQL submitted so far, in order.
    #[must_use]
    pub fn sent(&self) -> Vec<&str> {
        self.sent.iter().map(|(sql, _)| sql.as_str()).collect()
    }

    #[must_use]
    pub fn sent_kinds(&self) -> Vec<StatementKind> {
        self.sent.iter().map(|(_, kind)| *kind).collect()
    }

    /// Total number of `is_busy` calls.
    #[must_use]
    pub fn busy_checks(&self) -> u32 {
        self.busy_checks
    }

    /// Scripted steps not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl Session for ScriptedSession {
    fn send_query(&mut self, sql: &str, kind: StatementKind) -> Result<(), DataSourceError> {
        if self.in_flight.as_ref().is_some_and(|step| step.busy_polls > 0) {
            return Err(DataSourceError::Busy(
                "a statement is already in flight on this connection".into(),
            ));
        }
        self.sent.push((sql.to_string(), kind));
        let step = self.script.pop_front().ok_or_else(|| {
            DataSourceError::Connection(format!("no scripted reply left for: {sql}"))
        })?;
        self.in_flight = Some(step);
        Ok(())
    }

    fn is_busy(&mut self) -> bool {
        self.busy_checks = self.busy_checks.saturating_add(1);
        match self.in_flight.as_mut() {
            Some(step) if step.busy_polls > 0 => {
                step.busy_polls -= 1;
                true
            }
            _ => false,
        }
    }

    #[allow(clippy::manual_async_fn)]
    fn take_result(
        &mut self,
    ) -> impl Future<Output = Result<ServerReply, DataSourceError>> + Send {
        let result = match self.in_flight.take() {
            Some(Step {
                outcome: Outcome::Reply(reply),
                ..
            }) => Ok(reply),
            Some(Step {
                outcome: Outcome::Disconnect(reason),
                ..
            }) => Err(DataSourceError::Connection(reason)),
            None => Err(DataSourceError::Connection(
                "no statement was submitted".into(),
            )),
        };
        std::future::ready(result)
    }
}

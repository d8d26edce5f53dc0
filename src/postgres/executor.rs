use tokio::time::Instant;
use tracing::debug;

use crate::error::DataSourceError;
use crate::generator::{PostgresGenerator, SqlGenerator};
use crate::interpolation::Parameters;
use crate::query_builder::StatementBuilder;
use crate::results::RowSet;
use crate::types::Value;

use super::config::{DataSourceConfig, connect_session};
use super::decode::decode_rows;
use super::errors::translate;
use super::poll::{PollPolicy, StatementState, wait_until_idle};
use super::session::{PgSession, ServerReply, Session, StatementKind};

/// PostgreSQL data source over one exclusively owned session.
///
/// Every operation submits one statement, polls the session until it completes and then
/// decodes or translates the reply. Operations take `&mut self`, so statements on one data
/// source never overlap.
#[derive(Debug)]
pub struct PgDataSource<S: Session = PgSession> {
    session: S,
    generator: PostgresGenerator,
    poll: PollPolicy,
    state: StatementState,
}

impl PgDataSource<PgSession> {
    /// Connect to the configured server.
    ///
    /// # Errors
    /// Returns `Config`/`InvalidHost` for bad settings, `UnknownHost`, `Auth` or
    /// `UnknownSchema` for the matching connect failures, and `Connection` otherwise.
    pub async fn connect(config: &DataSourceConfig) -> Result<Self, DataSourceError> {
        let session = connect_session(config).await?;
        Ok(Self::with_session(session, config.poll))
    }

    /// Close the connection.
    pub fn close(self) {
        drop(self.session);
    }
}

impl<S: Session> PgDataSource<S> {
    pub fn with_session(session: S, poll: PollPolicy) -> Self {
        Self {
            session,
            generator: PostgresGenerator,
            poll,
            state: StatementState::Idle,
        }
    }

    /// State of the most recent statement.
    #[must_use]
    pub fn state(&self) -> StatementState {
        self.state
    }

    #[must_use]
    pub fn generator(&self) -> &PostgresGenerator {
        &self.generator
    }

    #[must_use]
    pub fn poll_policy(&self) -> &PollPolicy {
        &self.poll
    }

    #[must_use]
    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn into_session(self) -> S {
        self.session
    }

    /// Start a fluent statement.
    ///
    /// ```rust,no_run
    /// # use pg_datasource::prelude::*;
    /// # async fn demo(source: &mut PgDataSource) -> Result<(), DataSourceError> {
    /// let rows = source
    ///     .statement("SELECT name FROM users WHERE id = $1")
    ///     .params(&[Value::Int(42)])
    ///     .query()
    ///     .await?;
    /// # let _ = rows;
    /// # Ok(())
    /// # }
    /// ```
    pub fn statement<'src, 'q>(&'src mut self, sql: &'q str) -> StatementBuilder<'src, 'q, S> {
        StatementBuilder::new(self, sql)
    }

    /// Interpolate positional parameters into `sql` and run it, returning affected rows.
    ///
    /// # Errors
    /// Returns the translated server error, `Busy` if the session still has a statement in
    /// flight, `Timeout` if the poll deadline passes, or `Connection` on transport failure.
    pub async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, DataSourceError> {
        self.execute_with(sql, &Parameters::from(params)).await
    }

    /// Interpolate positional parameters into `sql` and run it, returning decoded rows.
    ///
    /// # Errors
    /// As [`PgDataSource::execute`], plus `Data` when a value does not decode.
    pub async fn query(&mut self, sql: &str, params: &[Value]) -> Result<RowSet, DataSourceError> {
        self.query_with(sql, &Parameters::from(params)).await
    }

    pub(crate) async fn execute_with(
        &mut self,
        sql: &str,
        params: &Parameters<'_>,
    ) -> Result<u64, DataSourceError> {
        let sql = self.generator.interpolate_parameters(sql, params);
        self.run_command(&sql).await
    }

    pub(crate) async fn query_with(
        &mut self,
        sql: &str,
        params: &Parameters<'_>,
    ) -> Result<RowSet, DataSourceError> {
        let sql = self.generator.interpolate_parameters(sql, params);
        self.run_query(&sql).await
    }

    /// Run a finished statement and return affected rows.
    pub(crate) async fn run_command(&mut self, sql: &str) -> Result<u64, DataSourceError> {
        let affected = match self.run(sql, StatementKind::Command).await? {
            ServerReply::Command { affected_rows } => affected_rows,
            ServerReply::Rows(raw) => raw.rows.len() as u64,
            ServerReply::Error(err) => return Err(translate(err)),
        };
        debug!(affected, "statement affected rows");
        Ok(affected)
    }

    /// Run a finished statement and decode its rows.
    pub(crate) async fn run_query(&mut self, sql: &str) -> Result<RowSet, DataSourceError> {
        let rows = match self.run(sql, StatementKind::Rows).await? {
            ServerReply::Rows(raw) => decode_rows(raw).inspect_err(|_| {
                self.state = StatementState::Failed;
            })?,
            ServerReply::Command { .. } => RowSet::default(),
            ServerReply::Error(err) => return Err(translate(err)),
        };
        debug!(rows = rows.len(), "statement returned rows");
        Ok(rows)
    }

    /// Submit, wait, collect. A server error reply leaves the state `Failed`.
    async fn run(&mut self, sql: &str, kind: StatementKind) -> Result<ServerReply, DataSourceError> {
        let started = Instant::now();
        let outcome = self.submit_and_wait(sql, kind).await;
        self.state = match &outcome {
            Ok(ServerReply::Error(_)) | Err(_) => StatementState::Failed,
            Ok(_) => StatementState::Succeeded,
        };
        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            state = ?self.state,
            "statement finished"
        );
        outcome
    }

    async fn submit_and_wait(
        &mut self,
        sql: &str,
        kind: StatementKind,
    ) -> Result<ServerReply, DataSourceError> {
        if self.session.is_busy() {
            return Err(DataSourceError::Busy(
                "the previous statement has not completed".into(),
            ));
        }
        debug!(%sql, ?kind, "submitting statement");
        self.session.send_query(sql, kind)?;
        self.state = StatementState::Sent;

        let busy_polls = wait_until_idle(&mut self.session, &self.poll).await?;
        debug!(busy_polls, "statement completed");
        self.session.take_result().await
    }
}

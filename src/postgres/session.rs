use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_postgres::{Client, SimpleQueryMessage};

use crate::error::{DataSourceError, ServerError};

/// Column metadata reported by the server: name and resolved type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescription {
    pub name: String,
    pub type_name: String,
}

impl ColumnDescription {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// Undecoded result set: server text per cell, `None` for NULL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRows {
    pub columns: Vec<ColumnDescription>,
    pub rows: Vec<Vec<Option<String>>>,
}

/// What the server answered for one statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerReply {
    Command { affected_rows: u64 },
    Rows(RawRows),
    Error(ServerError),
}

/// Whether a statement is expected to return rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Command,
    Rows,
}

/// One server connection, seen as a submit / busy / fetch protocol.
///
/// At most one statement is in flight: `send_query` hands the statement off without waiting,
/// `is_busy` reports whether the server is still working on it, and `take_result` collects the
/// reply once `is_busy` returns false. Transport failures are returned as errors; statement
/// failures come back as [`ServerReply::Error`].
pub trait Session: Send {
    /// Submit a statement without waiting for it.
    ///
    /// # Errors
    /// Returns `DataSourceError::Busy` if a statement is still in flight, or
    /// `DataSourceError::Connection` if the connection is gone.
    fn send_query(&mut self, sql: &str, kind: StatementKind) -> Result<(), DataSourceError>;

    /// True while the submitted statement has not completed.
    fn is_busy(&mut self) -> bool;

    /// Collect the reply of the completed statement.
    #[allow(clippy::manual_async_fn)]
    fn take_result(
        &mut self,
    ) -> impl Future<Output = Result<ServerReply, DataSourceError>> + Send;
}

/// [`Session`] over a `tokio_postgres` client.
///
/// The statement runs on a spawned task; busy means that task has not finished. Row queries
/// prepare the statement for column names and type names, then run it through the simple query
/// protocol so every cell arrives in the server's text format.
pub struct PgSession {
    client: Arc<Client>,
    in_flight: Option<JoinHandle<Result<ServerReply, DataSourceError>>>,
    connection_task: JoinHandle<()>,
}

impl PgSession {
    pub(crate) fn new(client: Client, connection_task: JoinHandle<()>) -> Self {
        Self {
            client: Arc::new(client),
            in_flight: None,
            connection_task,
        }
    }

    /// True once the server connection has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.client.is_closed()
    }
}

impl std::fmt::Debug for PgSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgSession")
            .field("closed", &self.client.is_closed())
            .field("in_flight", &self.in_flight.is_some())
            .finish()
    }
}

impl Drop for PgSession {
    fn drop(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
        self.connection_task.abort();
    }
}

impl Session for PgSession {
    fn send_query(&mut self, sql: &str, kind: StatementKind) -> Result<(), DataSourceError> {
        if self.is_busy() {
            return Err(DataSourceError::Busy(
                "a statement is already in flight on this connection".into(),
            ));
        }
        if self.client.is_closed() {
            return Err(DataSourceError::Connection("connection is closed".into()));
        }
        let client = Arc::clone(&self.client);
        let sql = sql.to_owned();
        self.in_flight = Some(tokio::spawn(async move {
            run_statement(&client, &sql, kind).await
        }));
        Ok(())
    }

    fn is_busy(&mut self) -> bool {
        self.in_flight
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    #[allow(clippy::manual_async_fn)]
    fn take_result(
        &mut self,
    ) -> impl Future<Output = Result<ServerReply, DataSourceError>> + Send {
        let handle = self.in_flight.take();
        async move {
            let handle = handle.ok_or_else(|| {
                DataSourceError::Connection("no statement was submitted".into())
            })?;
            handle.await.map_err(|e| {
                DataSourceError::Connection(format!("statement task failed: {e}"))
            })?
        }
    }
}

async fn run_statement(
    client: &Client,
    sql: &str,
    kind: StatementKind,
) -> Result<ServerReply, DataSourceError> {
    let outcome = match kind {
        StatementKind::Command => run_command(client, sql).await,
        StatementKind::Rows => run_rows(client, sql).await,
    };
    outcome.or_else(reply_from_error)
}

async fn run_command(client: &Client, sql: &str) -> Result<ServerReply, tokio_postgres::Error> {
    let messages = client.simple_query(sql).await?;
    let affected_rows = messages
        .iter()
        .rev()
        .find_map(|message| match message {
            SimpleQueryMessage::CommandComplete(rows) => Some(*rows),
            _ => None,
        })
        .unwrap_or(0);
    Ok(ServerReply::Command { affected_rows })
}

async fn run_rows(client: &Client, sql: &str) -> Result<ServerReply, tokio_postgres::Error> {
    let statement = client.prepare(sql).await?;
    let columns: Vec<ColumnDescription> = statement
        .columns()
        .iter()
        .map(|col| ColumnDescription::new(col.name(), col.type_().name()))
        .collect();

    let messages = client.simple_query(sql).await?;
    let mut rows = Vec::new();
    for message in &messages {
        if let SimpleQueryMessage::Row(row) = message {
            let mut cells = Vec::with_capacity(row.len());
            for idx in 0..row.len() {
                cells.push(row.try_get(idx)?.map(str::to_owned));
            }
            rows.push(cells);
        }
    }
    Ok(ServerReply::Rows(RawRows { columns, rows }))
}

/// Server-reported failures become replies; anything without a SQLSTATE is a transport error.
fn reply_from_error(err: tokio_postgres::Error) -> Result<ServerReply, DataSourceError> {
    match err.as_db_error() {
        Some(db) => Ok(ServerReply::Error(ServerError::new(
            db.code().code(),
            db.message(),
        ))),
        None => Err(DataSourceError::Connection(err.to_string())),
    }
}

// PostgreSQL module - the execution engine behind `PgDataSource`
//
// This module is split into several sub-modules:
// - config: connection settings and connecting
// - session: the submit / busy / fetch seam and its tokio-postgres implementation
// - poll: waiting for a submitted statement
// - decode: server text to `Value`
// - errors: SQLSTATE to `DataSourceError`
// - executor: `PgDataSource` and raw statement execution
// - operations: criteria-driven save/find/count/aggregate/update/delete
// - transaction: begin/commit/rollback

pub mod config;
pub mod decode;
pub mod errors;
pub mod executor;
mod operations;
pub mod poll;
pub mod session;
mod transaction;

// Re-export the public API
pub use config::{DEFAULT_PORT, DataSourceConfig};
pub use decode::{ColumnType, decode_rows, decode_value};
pub use errors::translate;
pub use executor::PgDataSource;
pub use poll::{DEFAULT_POLL_INTERVAL, PollPolicy, StatementState};
pub use session::{ColumnDescription, PgSession, RawRows, ServerReply, Session, StatementKind};

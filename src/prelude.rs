//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and traits
//! to make it easier to get started with the library.

pub use crate::criteria::{
    Aggregate, AggregateFunction, Collection, Criteria, Direction, Expression, Field, JoinKind,
    Operator,
};
pub use crate::error::{DataSourceError, ServerError};
pub use crate::generator::{PostgresGenerator, SqlGenerator};
pub use crate::interpolation::Parameters;
pub use crate::postgres::{
    DataSourceConfig, PgDataSource, PgSession, PollPolicy, Session, StatementState,
};
pub use crate::query_builder::StatementBuilder;
pub use crate::results::{Row, RowSet};
pub use crate::types::{FieldValues, Value};

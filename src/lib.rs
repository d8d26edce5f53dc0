//! PostgreSQL data source: criteria-driven SQL generation, a polling execution engine over a
//! single connection, and translation of server errors into typed failures.
//!
//! ```rust,no_run
//! use pg_datasource::prelude::*;
//!
//! # async fn demo() -> Result<(), DataSourceError> {
//! let config = DataSourceConfig::new("app", "localhost:5432", "app", "secret");
//! let mut source = PgDataSource::connect(&config).await?;
//!
//! let users = Collection::new("users");
//! let rows = source
//!     .find(&Criteria::new(users.clone()).filter(users.field("id").equals(42)))
//!     .await?;
//! for row in &rows {
//!     println!("{:?}", row.get("name"));
//! }
//! # Ok(())
//! # }
//! ```

pub mod criteria;
pub mod error;
pub mod generator;
pub mod interpolation;
pub mod postgres;
pub mod prelude;
pub mod query_builder;
pub mod results;
pub mod test_utils;
pub mod types;

pub use error::{DataSourceError, ServerError};
pub use generator::{PostgresGenerator, SqlGenerator};
pub use postgres::{DataSourceConfig, PgDataSource, PollPolicy, StatementState};
pub use results::{Row, RowSet};
pub use types::{FieldValues, Value};

use crate::criteria::{Aggregate, Collection, Criteria};
use crate::error::DataSourceError;
use crate::generator::SqlGenerator;
use crate::results::RowSet;
use crate::types::{FieldValues, Value};

use super::executor::PgDataSource;
use super::session::Session;

impl<S: Session> PgDataSource<S> {
    /// Insert one row. With a `sequence` name, read the value it just produced.
    ///
    /// The sequence read is `CURRVAL`, which the server tracks per session. It is only
    /// meaningful because the insert and the read run back to back on this data source's own
    /// session; do not share that session with another writer in between.
    ///
    /// # Errors
    /// Returns the translated server error of either statement.
    pub async fn save(
        &mut self,
        values: &FieldValues,
        collection: &Collection,
        sequence: Option<&str>,
    ) -> Result<Option<Value>, DataSourceError> {
        let sql = self.generator().generate_insert(values, collection);
        self.run_command(&sql).await?;

        let Some(sequence) = sequence else {
            return Ok(None);
        };
        let sql = self.generator().generate_sequence_select(sequence);
        let rows = self.run_query(&sql).await?;
        Ok(Some(rows.scalar()))
    }

    /// Insert every row in one statement and return how many were inserted.
    ///
    /// An empty batch returns 0 without contacting the server.
    ///
    /// # Errors
    /// Returns the translated server error; the server inserts nothing in that case.
    pub async fn save_multiple(
        &mut self,
        rows: &[FieldValues],
        collection: &Collection,
    ) -> Result<u64, DataSourceError> {
        if rows.is_empty() {
            return Ok(0);
        }
        let sql = self.generator().generate_multiple_insert(rows, collection);
        self.run_command(&sql).await
    }

    /// # Errors
    /// Returns the translated server error or `Data` for undecodable values.
    pub async fn find(&mut self, criteria: &Criteria) -> Result<RowSet, DataSourceError> {
        let sql = self.generator().generate_select(criteria);
        self.run_query(&sql).await
    }

    /// # Errors
    /// Returns the translated server error, or `Data` if the server does not answer with an
    /// integer.
    pub async fn count(&mut self, criteria: &Criteria) -> Result<i64, DataSourceError> {
        let sql = self.generator().generate_count(criteria);
        let scalar = self.run_query(&sql).await?.scalar();
        scalar
            .as_int()
            .ok_or_else(|| DataSourceError::Data(format!("count returned {scalar:?}")))
    }

    /// Run an aggregate and return its single value, `Value::Null` over no rows.
    ///
    /// # Errors
    /// Returns the translated server error or `Data` for an undecodable value.
    pub async fn aggregate(
        &mut self,
        aggregate: &Aggregate,
        criteria: &Criteria,
    ) -> Result<Value, DataSourceError> {
        let sql = self.generator().generate_aggregate(aggregate, criteria);
        Ok(self.run_query(&sql).await?.scalar())
    }

    /// # Errors
    /// Returns the translated server error.
    pub async fn update(
        &mut self,
        values: &FieldValues,
        criteria: &Criteria,
    ) -> Result<u64, DataSourceError> {
        let sql = self.generator().generate_update(values, criteria);
        self.run_command(&sql).await
    }

    /// # Errors
    /// Returns the translated server error.
    pub async fn delete(&mut self, criteria: &Criteria) -> Result<u64, DataSourceError> {
        let sql = self.generator().generate_delete(criteria);
        self.run_command(&sql).await
    }
}

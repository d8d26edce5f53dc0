use crate::error::DataSourceError;
use crate::postgres::Session;
use crate::results::RowSet;

use super::StatementBuilder;

impl<S: Session> StatementBuilder<'_, '_, S> {
    /// Run the statement and return its decoded rows.
    ///
    /// # Errors
    /// Returns the translated server error, `Data` for undecodable values, `Busy`, `Timeout`
    /// or `Connection`.
    pub async fn query(self) -> Result<RowSet, DataSourceError> {
        self.source.query_with(self.sql, &self.params).await
    }
}

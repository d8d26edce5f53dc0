use crate::error::DataSourceError;
use crate::postgres::Session;

use super::StatementBuilder;

impl<S: Session> StatementBuilder<'_, '_, S> {
    /// Run the statement and return rows affected.
    ///
    /// # Errors
    /// Returns the translated server error, `Busy`, `Timeout` or `Connection`.
    pub async fn execute(self) -> Result<u64, DataSourceError> {
        self.source.execute_with(self.sql, &self.params).await
    }
}

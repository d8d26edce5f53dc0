use crate::error::DataSourceError;

use super::executor::PgDataSource;
use super::session::Session;

const BEGIN: &str = "START TRANSACTION";
const COMMIT: &str = "COMMIT";
const ROLLBACK: &str = "ROLLBACK";

/// Transaction control. Nothing is tracked client-side: the statements go to the server as-is
/// and the server decides whether they are valid in the current session state.
impl<S: Session> PgDataSource<S> {
    /// # Errors
    /// Returns the translated server error.
    pub async fn begin_transaction(&mut self) -> Result<(), DataSourceError> {
        self.run_command(BEGIN).await.map(|_| ())
    }

    /// # Errors
    /// Returns the translated server error.
    pub async fn commit(&mut self) -> Result<(), DataSourceError> {
        self.run_command(COMMIT).await.map(|_| ())
    }

    /// # Errors
    /// Returns the translated server error.
    pub async fn rollback(&mut self) -> Result<(), DataSourceError> {
        self.run_command(ROLLBACK).await.map(|_| ())
    }
}

use crate::interpolation::Parameters;
use crate::postgres::{PgDataSource, PgSession, Session};
use crate::types::Value;

mod dml;
mod select;

/// Fluent builder for one raw statement with optional parameters.
///
/// Created by [`PgDataSource::statement`]. Parameters are interpolated as escaped literals
/// before the statement is submitted.
pub struct StatementBuilder<'src, 'q, S: Session = PgSession> {
    pub(crate) source: &'src mut PgDataSource<S>,
    pub(crate) sql: &'q str,
    pub(crate) params: Parameters<'q>,
}

impl<'src, 'q, S: Session> StatementBuilder<'src, 'q, S> {
    pub(crate) fn new(source: &'src mut PgDataSource<S>, sql: &'q str) -> Self {
        Self {
            source,
            sql,
            params: Parameters::None,
        }
    }

    /// Provide positional parameters for `?` and `$N` placeholders.
    #[must_use]
    pub fn params(mut self, params: &'q [Value]) -> Self {
        self.params = Parameters::Positional(params);
        self
    }

    /// Provide named parameters for `:name` placeholders.
    #[must_use]
    pub fn named(mut self, params: &'q [(&'q str, Value)]) -> Self {
        self.params = Parameters::Named(params);
        self
    }

    /// The statement text after interpolation, without running it.
    #[must_use]
    pub fn to_sql(&self) -> String {
        use crate::generator::SqlGenerator;
        self.source
            .generator()
            .interpolate_parameters(self.sql, &self.params)
            .into_owned()
    }
}

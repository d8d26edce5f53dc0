use tokio_postgres::error::SqlState;
use tracing::error;

use crate::error::{DataSourceError, ServerError};

/// Map a server-reported failure to a [`DataSourceError`].
///
/// | SQLSTATE | error |
/// |---|---|
/// | `42P01` | `UnknownCollection` |
/// | `42703` | `UnknownField` |
/// | `23505` | `DuplicateEntry` |
/// | other | `Query` |
///
/// The raw code and message stay inside the returned error.
#[must_use]
pub fn translate(err: ServerError) -> DataSourceError {
    error!(sqlstate = %err.code, message = %err.message, "statement failed");
    let state = SqlState::from_code(&err.code);
    if state == SqlState::UNDEFINED_TABLE {
        DataSourceError::UnknownCollection(err)
    } else if state == SqlState::UNDEFINED_COLUMN {
        DataSourceError::UnknownField(err)
    } else if state == SqlState::UNIQUE_VIOLATION {
        DataSourceError::DuplicateEntry(err)
    } else {
        DataSourceError::Query(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(code: &str) -> DataSourceError {
        translate(ServerError::new(code, "boom"))
    }

    #[test]
    fn known_codes() {
        assert!(matches!(kind("42P01"), DataSourceError::UnknownCollection(_)));
        assert!(matches!(kind("42703"), DataSourceError::UnknownField(_)));
        assert!(matches!(kind("23505"), DataSourceError::DuplicateEntry(_)));
    }

    #[test]
    fn everything_else_is_a_query_error() {
        for code in ["42601", "23503", "23502", "40001", "XX000", "", "zzzzz"] {
            assert!(matches!(kind(code), DataSourceError::Query(_)), "code {code}");
        }
    }

    #[test]
    fn raw_details_are_kept() {
        let err = translate(ServerError::new(
            "23505",
            "duplicate key value violates unique constraint \"users_email_key\"",
        ));
        assert_eq!(err.sqlstate(), Some("23505"));
        assert!(err.to_string().contains("users_email_key"));
        assert!(err.to_string().starts_with("Duplicate entry"));
    }

    #[test]
    fn mapping_is_deterministic() {
        for code in ["42P01", "42703", "23505", "42601"] {
            assert_eq!(
                std::mem::discriminant(&kind(code)),
                std::mem::discriminant(&kind(code))
            );
        }
    }
}

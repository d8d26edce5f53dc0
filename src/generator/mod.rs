// SQL generation - pure translation from criteria and values to SQL text
//
// - render: dialect-independent statement assembly
// - postgres: the PostgreSQL dialect (quoting, escaping, pattern operators)

mod postgres;
mod render;

use std::borrow::Cow;

pub use postgres::PostgresGenerator;

use crate::criteria::{Aggregate, Collection, Criteria, Expression, Field};
use crate::interpolation::{Parameters, interpolate_parameters};
use crate::types::{FieldValues, Value};

/// Dialect-aware SQL generation.
///
/// A dialect supplies identifier quoting, literal escaping and the pattern-matching operators;
/// statement assembly is shared. Every identifier and literal in a generated statement goes
/// through [`SqlGenerator::escape_identifier`], [`SqlGenerator::escape_field`] or
/// [`SqlGenerator::escape_value`]. Generation never fails and never contacts the server:
/// malformed criteria produce SQL that the server rejects.
pub trait SqlGenerator {
    /// Quote an identifier. Embedded quote characters are not escaped.
    fn escape_identifier(&self, name: &str) -> String;

    /// Render a possibly qualified column reference.
    fn escape_field(&self, field: &Field) -> String;

    /// Render a literal.
    fn escape_value(&self, value: &Value) -> String;

    /// Case-insensitive LIKE.
    fn render_like(&self, a: &str, b: &str) -> String;

    /// Pattern-similarity match.
    fn render_regex(&self, a: &str, b: &str) -> String;

    /// Statement reading the last value a sequence produced in this session.
    fn generate_sequence_select(&self, sequence: &str) -> String;

    /// Render a table reference, with its alias when present.
    fn escape_collection(&self, collection: &Collection) -> String {
        let name = self.escape_identifier(&collection.name);
        match &collection.alias {
            Some(alias) => format!("{name} AS {}", self.escape_identifier(alias)),
            None => name,
        }
    }

    fn render_expression(&self, expression: &Expression) -> String {
        render::expression(self, expression)
    }

    fn generate_select(&self, criteria: &Criteria) -> String {
        render::select(self, criteria)
    }

    fn generate_count(&self, criteria: &Criteria) -> String {
        render::count(self, criteria)
    }

    fn generate_aggregate(&self, aggregate: &Aggregate, criteria: &Criteria) -> String {
        render::aggregate(self, aggregate, criteria)
    }

    fn generate_update(&self, values: &FieldValues, criteria: &Criteria) -> String {
        render::update(self, values, criteria)
    }

    fn generate_delete(&self, criteria: &Criteria) -> String {
        render::delete(self, criteria)
    }

    fn generate_insert(&self, values: &FieldValues, collection: &Collection) -> String {
        render::insert(self, values, collection)
    }

    /// One statement inserting every row. The column list is every name used by any row, in
    /// the order first seen; a row without one of those columns inserts `NULL` there.
    fn generate_multiple_insert(&self, rows: &[FieldValues], collection: &Collection) -> String {
        render::multiple_insert(self, rows, collection)
    }

    /// Substitute placeholders in pre-built SQL with escaped literals.
    fn interpolate_parameters<'s>(&self, sql: &'s str, params: &Parameters<'_>) -> Cow<'s, str> {
        interpolate_parameters(sql, params, |value| self.escape_value(value))
    }
}

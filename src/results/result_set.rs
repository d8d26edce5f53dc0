use std::sync::Arc;

use crate::types::Value;

use super::row::{Columns, Row};

/// Rows returned by a query, in server order.
///
/// Column names and type tags are stored once and shared by all rows.
#[derive(Debug, Clone, PartialEq)]
pub struct RowSet {
    columns: Arc<Columns>,
    rows: Vec<Row>,
}

impl RowSet {
    /// Create an empty result set for the given columns.
    #[must_use]
    pub fn new(column_names: Vec<String>, type_tags: Vec<String>) -> Self {
        Self::with_capacity(column_names, type_tags, 0)
    }

    #[must_use]
    pub fn with_capacity(column_names: Vec<String>, type_tags: Vec<String>, capacity: usize) -> Self {
        Self {
            columns: Arc::new(Columns::new(column_names, type_tags)),
            rows: Vec::with_capacity(capacity),
        }
    }

    /// Append a row; values are given in column order.
    pub fn add_row_values(&mut self, values: Vec<Value>) {
        self.rows.push(Row {
            columns: Arc::clone(&self.columns),
            values,
        });
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.columns.names
    }

    /// Server type name per column, e.g. `int4`.
    #[must_use]
    pub fn column_types(&self) -> &[String] {
        &self.columns.type_tags
    }

    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    #[must_use]
    pub fn first(&self) -> Option<&Row> {
        self.rows.first()
    }

    /// First column of the first row, or `Value::Null` for an empty result.
    #[must_use]
    pub fn scalar(&self) -> Value {
        self.rows
            .first()
            .and_then(|row| row.get_by_index(0))
            .cloned()
            .unwrap_or(Value::Null)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Default for RowSet {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}

impl IntoIterator for RowSet {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a RowSet {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RowSet {
        let mut rs = RowSet::new(
            vec!["id".into(), "name".into(), "id".into()],
            vec!["int4".into(), "text".into(), "int8".into()],
        );
        rs.add_row_values(vec![Value::Int(1), Value::Text("a".into()), Value::Int(10)]);
        rs.add_row_values(vec![Value::Int(2), Value::Null, Value::Int(20)]);
        rs
    }

    #[test]
    fn rows_keep_order_and_share_columns() {
        let rs = sample();
        assert_eq!(rs.len(), 2);
        assert_eq!(rs.column_types(), ["int4", "text", "int8"]);
        assert_eq!(rs.rows()[1].get("name"), Some(&Value::Null));
        let names: Vec<&str> = rs.rows()[0].iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["id", "name", "id"]);
    }

    #[test]
    fn duplicate_names_resolve_to_first_column() {
        let rs = sample();
        assert_eq!(rs.rows()[0].get("id"), Some(&Value::Int(1)));
        assert_eq!(rs.rows()[0].get_by_index(2), Some(&Value::Int(10)));
    }

    #[test]
    fn scalar_reads_first_cell_or_null() {
        assert_eq!(sample().scalar(), Value::Int(1));
        assert_eq!(RowSet::default().scalar(), Value::Null);
    }

    #[test]
    fn rows_serialize_as_ordered_objects() {
        let rs = sample();
        let json = serde_json::to_string(&rs.rows()[0]).unwrap();
        assert_eq!(json, r#"{"id":1,"name":"a","id":10}"#);
    }
}

use chrono::Utc;

use crate::criteria::Field;
use crate::types::Value;

use super::SqlGenerator;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// PostgreSQL dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresGenerator;

impl PostgresGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl SqlGenerator for PostgresGenerator {
    fn escape_identifier(&self, name: &str) -> String {
        format!("\"{name}\"")
    }

    fn escape_field(&self, field: &Field) -> String {
        let escaped = self.escape_identifier(&field.name);
        match &field.collection {
            Some(collection) => format!(
                "{}.{escaped}",
                self.escape_identifier(collection.qualifier())
            ),
            None => escaped,
        }
    }

    fn escape_value(&self, value: &Value) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(true) => "TRUE".to_string(),
            Value::Bool(false) => "FALSE".to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) if f.is_nan() => "'NaN'::float8".to_string(),
            Value::Float(f) if f.is_infinite() && f.is_sign_positive() => {
                "'Infinity'::float8".to_string()
            }
            Value::Float(f) if f.is_infinite() => "'-Infinity'::float8".to_string(),
            Value::Float(f) => format!("{f:?}"),
            Value::Text(text) => quote_literal(text),
            Value::Timestamp(ts) => quote_literal(&ts.format(TIMESTAMP_FORMAT).to_string()),
            Value::TimestampTz(ts) => quote_literal(
                &ts.with_timezone(&Utc).format(TIMESTAMP_FORMAT).to_string(),
            ),
            Value::Json(json) => quote_literal(&json.to_string()),
            Value::Opaque(object) => quote_literal(&object.to_string()),
        }
    }

    fn render_like(&self, a: &str, b: &str) -> String {
        format!("{a} ILIKE {b}")
    }

    fn render_regex(&self, a: &str, b: &str) -> String {
        format!("{a} SIMILAR TO {b}")
    }

    fn generate_sequence_select(&self, sequence: &str) -> String {
        format!("SELECT CURRVAL({})", quote_literal(sequence))
    }
}

/// Quote text as a string constant.
///
/// Quotes are doubled. Text containing a backslash is written as an escape string (`E'...'`)
/// with doubled backslashes, which reads back the same whatever `standard_conforming_strings`
/// is set to. Text stops at the first NUL, which server text cannot hold.
fn quote_literal(text: &str) -> String {
    let text = text.find('\0').map_or(text, |nul| &text[..nul]);
    let mut out = String::with_capacity(text.len() + 3);
    if text.contains('\\') {
        out.push('E');
    }
    out.push('\'');
    for ch in text.chars() {
        match ch {
            '\'' => out.push_str("''"),
            '\\' => out.push_str("\\\\"),
            other => out.push(other),
        }
    }
    out.push('\'');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::{Aggregate, Collection, Criteria, Direction};
    use crate::interpolation::Parameters;
    use crate::types::FieldValues;
    use chrono::{FixedOffset, NaiveDate, TimeZone};

    const PG: PostgresGenerator = PostgresGenerator;

    fn users() -> Collection {
        Collection::new("users")
    }

    #[test]
    fn identifiers_are_quoted_verbatim() {
        assert_eq!(PG.escape_identifier("users"), "\"users\"");
        assert_eq!(PG.escape_identifier("we\"ird"), "\"we\"ird\"");
    }

    #[test]
    fn fields_prefer_alias_over_collection_name() {
        assert_eq!(PG.escape_field(&Field::new("id")), "\"id\"");
        assert_eq!(PG.escape_field(&users().field("id")), "\"users\".\"id\"");
        let aliased = users().with_alias("u");
        assert_eq!(PG.escape_field(&aliased.field("id")), "\"u\".\"id\"");
    }

    #[test]
    fn scalar_literals() {
        assert_eq!(PG.escape_value(&Value::Null), "NULL");
        assert_eq!(PG.escape_value(&Value::Bool(true)), "TRUE");
        assert_eq!(PG.escape_value(&Value::Bool(false)), "FALSE");
        assert_eq!(PG.escape_value(&Value::Int(-42)), "-42");
        assert_eq!(PG.escape_value(&Value::Float(1.5)), "1.5");
        assert_eq!(PG.escape_value(&Value::Float(2.0)), "2.0");
        assert_eq!(PG.escape_value(&Value::Float(f64::NAN)), "'NaN'::float8");
        assert_eq!(
            PG.escape_value(&Value::Float(f64::NEG_INFINITY)),
            "'-Infinity'::float8"
        );
    }

    #[test]
    fn text_quotes_and_backslashes_are_escaped() {
        assert_eq!(PG.escape_value(&Value::from("plain")), "'plain'");
        assert_eq!(PG.escape_value(&Value::from("O'Reilly")), "'O''Reilly'");
        assert_eq!(PG.escape_value(&Value::from(r"a\b")), r"E'a\\b'");
        assert_eq!(
            PG.escape_value(&Value::from(r"x\'; DROP TABLE users; --")),
            r"E'x\\''; DROP TABLE users; --'"
        );
        assert_eq!(PG.escape_value(&Value::from("cut\0here")), "'cut'");
    }

    #[test]
    fn timestamps_are_normalized_to_utc_whole_seconds() {
        let naive = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_micro_opt(23, 59, 58, 123_456)
            .unwrap();
        assert_eq!(
            PG.escape_value(&Value::Timestamp(naive)),
            "'2024-02-29 23:59:58'"
        );

        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        let local = offset.with_ymd_and_hms(2024, 2, 29, 22, 0, 0).unwrap();
        assert_eq!(
            PG.escape_value(&Value::TimestampTz(local)),
            "'2024-03-01 03:00:00'"
        );
    }

    #[test]
    fn opaque_values_go_through_the_text_rule() {
        assert_eq!(PG.escape_value(&Value::opaque("it's")), "'it''s'");
        let json = serde_json::json!({"k": "v'"});
        assert_eq!(PG.escape_value(&Value::Json(json)), r#"'{"k":"v''"}'"#);
    }

    #[test]
    fn pattern_operators() {
        let criteria = Criteria::new(users())
            .filter(users().field("name").like("%ann%"))
            .filter(users().field("code").matches("[0-9]+"));
        assert_eq!(
            PG.generate_select(&criteria),
            "SELECT * FROM \"users\" WHERE \"users\".\"name\" ILIKE '%ann%' AND \"users\".\"code\" SIMILAR TO '[0-9]+'"
        );
    }

    #[test]
    fn select_by_id() {
        let criteria = Criteria::new(users()).filter(users().field("id").equals(42));
        assert_eq!(
            PG.generate_select(&criteria),
            "SELECT * FROM \"users\" WHERE \"users\".\"id\" = 42"
        );
    }

    #[test]
    fn select_with_join_order_and_pagination() {
        let u = users().with_alias("u");
        let p = Collection::new("posts").with_alias("p");
        let criteria = Criteria::new(u.clone())
            .select([u.field("name"), p.field("title")])
            .distinct()
            .inner_join(p.clone(), p.field("user_id").equals_field(u.field("id")))
            .filter(u.field("age").ge(18).or(u.field("admin").equals(true)))
            .filter(p.field("deleted_at").equals(Value::Null))
            .order_by(p.field("title"), Direction::Desc)
            .limit(10)
            .offset(20);
        assert_eq!(
            PG.generate_select(&criteria),
            "SELECT DISTINCT \"u\".\"name\", \"p\".\"title\" FROM \"users\" AS \"u\" \
             INNER JOIN \"posts\" AS \"p\" ON \"p\".\"user_id\" = \"u\".\"id\" \
             WHERE (\"u\".\"age\" >= 18 OR \"u\".\"admin\" = TRUE) AND \"p\".\"deleted_at\" IS NULL \
             ORDER BY \"p\".\"title\" DESC LIMIT 10 OFFSET 20"
        );
    }

    #[test]
    fn in_between_and_negation() {
        let id = || Field::new("id");
        let criteria = Criteria::new(users())
            .filter(id().is_in([1, 2, 3]))
            .filter(id().not_in(Vec::<i64>::new()))
            .filter(!id().between(5, 9))
            .filter(id().is_not_null());
        assert_eq!(
            PG.generate_select(&criteria),
            "SELECT * FROM \"users\" WHERE \"id\" IN (1, 2, 3) AND TRUE AND NOT (\"id\" BETWEEN 5 AND 9) AND \"id\" IS NOT NULL"
        );
    }

    #[test]
    fn count_and_aggregate() {
        let criteria = Criteria::new(users()).filter(users().field("active").equals(true));
        assert_eq!(
            PG.generate_count(&criteria),
            "SELECT COUNT(*) FROM \"users\" WHERE \"users\".\"active\" = TRUE"
        );
        assert_eq!(
            PG.generate_aggregate(&Aggregate::max(users().field("age")), &criteria),
            "SELECT MAX(\"users\".\"age\") FROM \"users\" WHERE \"users\".\"active\" = TRUE"
        );
        assert_eq!(
            PG.generate_aggregate(&Aggregate::count(Field::new("city")).distinct(), &criteria),
            "SELECT COUNT(DISTINCT \"city\") FROM \"users\" WHERE \"users\".\"active\" = TRUE"
        );
    }

    #[test]
    fn update_and_delete() {
        let criteria = Criteria::new(users()).filter(users().field("id").equals(7));
        let values = FieldValues::new().with("name", "Zoë").with("score", 1.25);
        assert_eq!(
            PG.generate_update(&values, &criteria),
            "UPDATE \"users\" SET \"name\" = 'Zoë', \"score\" = 1.25 WHERE \"users\".\"id\" = 7"
        );
        assert_eq!(
            PG.generate_delete(&criteria),
            "DELETE FROM \"users\" WHERE \"users\".\"id\" = 7"
        );
    }

    #[test]
    fn inserts() {
        let values = FieldValues::new().with("name", "a").with("nick", Value::Null);
        assert_eq!(
            PG.generate_insert(&values, &users()),
            "INSERT INTO \"users\" (\"name\", \"nick\") VALUES ('a', NULL)"
        );
        assert_eq!(
            PG.generate_insert(&FieldValues::new(), &users()),
            "INSERT INTO \"users\" DEFAULT VALUES"
        );
    }

    #[test]
    fn multiple_insert_is_one_statement() {
        let rows = vec![
            FieldValues::new().with("name", "a").with("age", 1),
            FieldValues::new().with("age", 2).with("name", "b"),
            FieldValues::new().with("name", "c"),
        ];
        assert_eq!(
            PG.generate_multiple_insert(&rows, &users()),
            "INSERT INTO \"users\" (\"name\", \"age\") VALUES ('a', 1), ('b', 2), ('c', NULL)"
        );
    }

    #[test]
    fn multiple_insert_keeps_columns_first_seen_in_later_rows() {
        let rows = vec![
            FieldValues::new().with("name", "a"),
            FieldValues::new().with("name", "b").with("email", "b@x"),
            FieldValues::new().with("age", 3),
        ];
        assert_eq!(
            PG.generate_multiple_insert(&rows, &users()),
            "INSERT INTO \"users\" (\"name\", \"email\", \"age\") \
             VALUES ('a', NULL, NULL), ('b', 'b@x', NULL), (NULL, NULL, 3)"
        );
    }

    #[test]
    fn sequence_select() {
        assert_eq!(
            PG.generate_sequence_select("users_id_seq"),
            "SELECT CURRVAL('users_id_seq')"
        );
    }

    #[test]
    fn interpolation_escapes_every_value() {
        let params = [Value::from("x' OR '1'='1"), Value::Bool(false)];
        let sql = PG.interpolate_parameters(
            "SELECT * FROM \"users\" WHERE name = ? AND active = $2",
            &Parameters::Positional(&params),
        );
        assert_eq!(
            sql,
            "SELECT * FROM \"users\" WHERE name = 'x'' OR ''1''=''1' AND active = FALSE"
        );
    }
}

use crate::criteria::{Aggregate, Collection, Criteria, Direction, Expression, Operator};
use crate::types::{FieldValues, Value};

use super::SqlGenerator;

fn comma_separated(items: impl Iterator<Item = String>) -> String {
    items.collect::<Vec<_>>().join(", ")
}

pub(super) fn expression<G: SqlGenerator + ?Sized>(g: &G, expression: &Expression) -> String {
    match expression {
        Expression::Compare {
            field,
            op: Operator::Eq,
            value: Value::Null,
        } => format!("{} IS NULL", g.escape_field(field)),
        Expression::Compare {
            field,
            op: Operator::Ne,
            value: Value::Null,
        } => format!("{} IS NOT NULL", g.escape_field(field)),
        Expression::Compare { field, op, value } => format!(
            "{} {} {}",
            g.escape_field(field),
            op.as_sql(),
            g.escape_value(value)
        ),
        Expression::CompareFields { left, op, right } => format!(
            "{} {} {}",
            g.escape_field(left),
            op.as_sql(),
            g.escape_field(right)
        ),
        Expression::Like { field, pattern } => {
            g.render_like(&g.escape_field(field), &g.escape_value(pattern))
        }
        Expression::Regex { field, pattern } => {
            g.render_regex(&g.escape_field(field), &g.escape_value(pattern))
        }
        Expression::Between { field, low, high } => format!(
            "{} BETWEEN {} AND {}",
            g.escape_field(field),
            g.escape_value(low),
            g.escape_value(high)
        ),
        Expression::In {
            values, negated, ..
        } if values.is_empty() => {
            (if *negated { "TRUE" } else { "FALSE" }).to_string()
        }
        Expression::In {
            field,
            values,
            negated,
        } => format!(
            "{} {}IN ({})",
            g.escape_field(field),
            if *negated { "NOT " } else { "" },
            comma_separated(values.iter().map(|value| g.escape_value(value)))
        ),
        Expression::IsNull { field, negated } => format!(
            "{} IS {}NULL",
            g.escape_field(field),
            if *negated { "NOT " } else { "" }
        ),
        Expression::And(items) => group(g, items, " AND ", "TRUE"),
        Expression::Or(items) => group(g, items, " OR ", "FALSE"),
        Expression::Not(inner) => format!("NOT ({})", g.render_expression(inner)),
    }
}

fn group<G: SqlGenerator + ?Sized>(
    g: &G,
    items: &[Expression],
    separator: &str,
    identity: &str,
) -> String {
    match items {
        [] => identity.to_string(),
        [single] => g.render_expression(single),
        _ => {
            let parts: Vec<String> = items.iter().map(|item| g.render_expression(item)).collect();
            format!("({})", parts.join(separator))
        }
    }
}

fn push_from<G: SqlGenerator + ?Sized>(g: &G, sql: &mut String, criteria: &Criteria) {
    sql.push_str(" FROM ");
    sql.push_str(&g.escape_collection(&criteria.collection));
    for join in &criteria.joins {
        sql.push(' ');
        sql.push_str(join.kind.as_sql());
        sql.push(' ');
        sql.push_str(&g.escape_collection(&join.collection));
        sql.push_str(" ON ");
        sql.push_str(&g.render_expression(&join.on));
    }
}

fn push_where<G: SqlGenerator + ?Sized>(g: &G, sql: &mut String, criteria: &Criteria) {
    if criteria.expressions.is_empty() {
        return;
    }
    sql.push_str(" WHERE ");
    let parts: Vec<String> = criteria
        .expressions
        .iter()
        .map(|item| g.render_expression(item))
        .collect();
    sql.push_str(&parts.join(" AND "));
}

pub(super) fn select<G: SqlGenerator + ?Sized>(g: &G, criteria: &Criteria) -> String {
    let mut sql = String::from("SELECT ");
    if criteria.distinct {
        sql.push_str("DISTINCT ");
    }
    if criteria.fields.is_empty() {
        sql.push('*');
    } else {
        sql.push_str(&comma_separated(
            criteria.fields.iter().map(|field| g.escape_field(field)),
        ));
    }
    push_from(g, &mut sql, criteria);
    push_where(g, &mut sql, criteria);

    if !criteria.order.is_empty() {
        sql.push_str(" ORDER BY ");
        sql.push_str(&comma_separated(criteria.order.iter().map(|order| {
            let direction = match order.direction {
                Direction::Asc => "ASC",
                Direction::Desc => "DESC",
            };
            format!("{} {direction}", g.escape_field(&order.field))
        })));
    }
    if let Some(limit) = criteria.limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }
    if let Some(offset) = criteria.offset {
        sql.push_str(&format!(" OFFSET {offset}"));
    }
    sql
}

pub(super) fn count<G: SqlGenerator + ?Sized>(g: &G, criteria: &Criteria) -> String {
    let target = match criteria.fields.as_slice() {
        [field] if criteria.distinct => format!("DISTINCT {}", g.escape_field(field)),
        [] => "*".to_string(),
        fields if criteria.distinct => format!(
            "DISTINCT ({})",
            comma_separated(fields.iter().map(|field| g.escape_field(field)))
        ),
        _ => "*".to_string(),
    };
    let mut sql = format!("SELECT COUNT({target})");
    push_from(g, &mut sql, criteria);
    push_where(g, &mut sql, criteria);
    sql
}

pub(super) fn aggregate<G: SqlGenerator + ?Sized>(
    g: &G,
    aggregate: &Aggregate,
    criteria: &Criteria,
) -> String {
    let target = match &aggregate.field {
        Some(field) if aggregate.distinct => format!("DISTINCT {}", g.escape_field(field)),
        Some(field) => g.escape_field(field),
        None => "*".to_string(),
    };
    let mut sql = format!("SELECT {}({target})", aggregate.function.as_sql());
    push_from(g, &mut sql, criteria);
    push_where(g, &mut sql, criteria);
    sql
}

pub(super) fn update<G: SqlGenerator + ?Sized>(
    g: &G,
    values: &FieldValues,
    criteria: &Criteria,
) -> String {
    let assignments = comma_separated(values.iter().map(|(name, value)| {
        format!("{} = {}", g.escape_identifier(name), g.escape_value(value))
    }));
    let mut sql = format!(
        "UPDATE {} SET {assignments}",
        g.escape_collection(&criteria.collection)
    );
    push_where(g, &mut sql, criteria);
    sql
}

pub(super) fn delete<G: SqlGenerator + ?Sized>(g: &G, criteria: &Criteria) -> String {
    let mut sql = format!(
        "DELETE FROM {}",
        g.escape_collection(&criteria.collection)
    );
    push_where(g, &mut sql, criteria);
    sql
}

pub(super) fn insert<G: SqlGenerator + ?Sized>(
    g: &G,
    values: &FieldValues,
    collection: &Collection,
) -> String {
    let table = g.escape_identifier(&collection.name);
    if values.is_empty() {
        return format!("INSERT INTO {table} DEFAULT VALUES");
    }
    let columns = comma_separated(values.names().map(|name| g.escape_identifier(name)));
    let row = comma_separated(values.iter().map(|(_, value)| g.escape_value(value)));
    format!("INSERT INTO {table} ({columns}) VALUES ({row})")
}

pub(super) fn multiple_insert<G: SqlGenerator + ?Sized>(
    g: &G,
    rows: &[FieldValues],
    collection: &Collection,
) -> String {
    let table = g.escape_identifier(&collection.name);
    // every column named by any row, in first-seen order
    let mut names: Vec<&str> = Vec::new();
    for name in rows.iter().flat_map(|row| row.names()) {
        if !names.contains(&name) {
            names.push(name);
        }
    }

    let tuples = comma_separated(rows.iter().map(|row| {
        if names.is_empty() {
            return "(DEFAULT)".to_string();
        }
        let cells = comma_separated(names.iter().map(|name| {
            row.get(name)
                .map_or_else(|| g.escape_value(&Value::Null), |value| g.escape_value(value))
        }));
        format!("({cells})")
    }));

    if names.is_empty() {
        format!("INSERT INTO {table} VALUES {tuples}")
    } else {
        let columns = comma_separated(names.iter().map(|name| g.escape_identifier(name)));
        format!("INSERT INTO {table} ({columns}) VALUES {tuples}")
    }
}

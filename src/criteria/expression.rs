use std::ops::Not;

use crate::types::Value;

use super::reference::Field;

/// Binary comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Operator {
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "<>",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
        }
    }
}

/// Predicate tree consumed by the generator.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Compare {
        field: Field,
        op: Operator,
        value: Value,
    },
    CompareFields {
        left: Field,
        op: Operator,
        right: Field,
    },
    Like {
        field: Field,
        pattern: Value,
    },
    Regex {
        field: Field,
        pattern: Value,
    },
    Between {
        field: Field,
        low: Value,
        high: Value,
    },
    In {
        field: Field,
        values: Vec<Value>,
        negated: bool,
    },
    IsNull {
        field: Field,
        negated: bool,
    },
    And(Vec<Expression>),
    Or(Vec<Expression>),
    Not(Box<Expression>),
}

impl Expression {
    /// Conjunction, flattening nested `And` groups.
    #[must_use]
    pub fn and(self, other: Expression) -> Expression {
        match self {
            Expression::And(mut items) => {
                items.push(other);
                Expression::And(items)
            }
            first => Expression::And(vec![first, other]),
        }
    }

    /// Disjunction, flattening nested `Or` groups.
    #[must_use]
    pub fn or(self, other: Expression) -> Expression {
        match self {
            Expression::Or(mut items) => {
                items.push(other);
                Expression::Or(items)
            }
            first => Expression::Or(vec![first, other]),
        }
    }
}

impl Not for Expression {
    type Output = Expression;

    fn not(self) -> Self::Output {
        Expression::Not(Box::new(self))
    }
}

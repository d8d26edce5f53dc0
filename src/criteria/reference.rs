use crate::types::Value;

use super::expression::{Expression, Operator};

/// A table reference, optionally under an alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    pub name: String,
    pub alias: Option<String>,
}

impl Collection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
        }
    }

    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Name used to qualify fields: the alias when present, else the table name.
    #[must_use]
    pub fn qualifier(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// A field owned by this collection.
    pub fn field(&self, name: impl Into<String>) -> Field {
        Field {
            name: name.into(),
            collection: Some(self.clone()),
        }
    }
}

/// A column reference, optionally qualified by its owning collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub collection: Option<Collection>,
}

impl Field {
    /// An unqualified field.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collection: None,
        }
    }

    pub fn compare(self, op: Operator, value: impl Into<Value>) -> Expression {
        Expression::Compare {
            field: self,
            op,
            value: value.into(),
        }
    }

    pub fn equals(self, value: impl Into<Value>) -> Expression {
        self.compare(Operator::Eq, value)
    }

    pub fn not_equals(self, value: impl Into<Value>) -> Expression {
        self.compare(Operator::Ne, value)
    }

    pub fn lt(self, value: impl Into<Value>) -> Expression {
        self.compare(Operator::Lt, value)
    }

    pub fn le(self, value: impl Into<Value>) -> Expression {
        self.compare(Operator::Le, value)
    }

    pub fn gt(self, value: impl Into<Value>) -> Expression {
        self.compare(Operator::Gt, value)
    }

    pub fn ge(self, value: impl Into<Value>) -> Expression {
        self.compare(Operator::Ge, value)
    }

    /// Field-to-field comparison, typically a join condition.
    pub fn equals_field(self, other: Field) -> Expression {
        Expression::CompareFields {
            left: self,
            op: Operator::Eq,
            right: other,
        }
    }

    /// Case-insensitive pattern match.
    pub fn like(self, pattern: impl Into<Value>) -> Expression {
        Expression::Like {
            field: self,
            pattern: pattern.into(),
        }
    }

    /// Regular-expression style pattern match.
    pub fn matches(self, pattern: impl Into<Value>) -> Expression {
        Expression::Regex {
            field: self,
            pattern: pattern.into(),
        }
    }

    pub fn between(self, low: impl Into<Value>, high: impl Into<Value>) -> Expression {
        Expression::Between {
            field: self,
            low: low.into(),
            high: high.into(),
        }
    }

    pub fn is_in<I, V>(self, values: I) -> Expression
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Expression::In {
            field: self,
            values: values.into_iter().map(Into::into).collect(),
            negated: false,
        }
    }

    pub fn not_in<I, V>(self, values: I) -> Expression
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Expression::In {
            field: self,
            values: values.into_iter().map(Into::into).collect(),
            negated: true,
        }
    }

    pub fn is_null(self) -> Expression {
        Expression::IsNull {
            field: self,
            negated: false,
        }
    }

    pub fn is_not_null(self) -> Expression {
        Expression::IsNull {
            field: self,
            negated: true,
        }
    }
}

// Criteria model - the dialect-independent description of a statement
//
// - reference: collections (tables) and fields (columns)
// - expression: predicate trees
// - aggregate: aggregate function descriptors

mod aggregate;
mod expression;
mod reference;

pub use aggregate::{Aggregate, AggregateFunction};
pub use expression::{Expression, Operator};
pub use reference::{Collection, Field};

/// Sort direction for an ordering term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub field: Field,
    pub direction: Direction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
}

impl JoinKind {
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::Full => "FULL JOIN",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub kind: JoinKind,
    pub collection: Collection,
    pub on: Expression,
}

/// Predicates, projection, joins, ordering and pagination for one collection.
///
/// ```rust
/// use pg_datasource::criteria::{Collection, Criteria};
///
/// let users = Collection::new("users");
/// let criteria = Criteria::new(users.clone())
///     .filter(users.field("id").equals(42))
///     .limit(1);
/// # let _ = criteria;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Criteria {
    pub collection: Collection,
    /// Projection; empty selects every column.
    pub fields: Vec<Field>,
    pub distinct: bool,
    pub joins: Vec<Join>,
    /// Predicates combined with `AND`.
    pub expressions: Vec<Expression>,
    pub order: Vec<Order>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl Criteria {
    #[must_use]
    pub fn new(collection: Collection) -> Self {
        Self {
            collection,
            fields: Vec::new(),
            distinct: false,
            joins: Vec::new(),
            expressions: Vec::new(),
            order: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    #[must_use]
    pub fn select(mut self, fields: impl IntoIterator<Item = Field>) -> Self {
        self.fields.extend(fields);
        self
    }

    #[must_use]
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    #[must_use]
    pub fn join(mut self, kind: JoinKind, collection: Collection, on: Expression) -> Self {
        self.joins.push(Join {
            kind,
            collection,
            on,
        });
        self
    }

    #[must_use]
    pub fn inner_join(self, collection: Collection, on: Expression) -> Self {
        self.join(JoinKind::Inner, collection, on)
    }

    #[must_use]
    pub fn left_join(self, collection: Collection, on: Expression) -> Self {
        self.join(JoinKind::Left, collection, on)
    }

    #[must_use]
    pub fn filter(mut self, expression: Expression) -> Self {
        self.expressions.push(expression);
        self
    }

    #[must_use]
    pub fn order_by(mut self, field: Field, direction: Direction) -> Self {
        self.order.push(Order { field, direction });
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }
}

impl From<Collection> for Criteria {
    fn from(collection: Collection) -> Self {
        Self::new(collection)
    }
}

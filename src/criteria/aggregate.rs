use super::reference::Field;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFunction {
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            AggregateFunction::Count => "COUNT",
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Avg => "AVG",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Max => "MAX",
        }
    }
}

/// Aggregate function applied to a field, or to `*` when no field is given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    pub function: AggregateFunction,
    pub field: Option<Field>,
    pub distinct: bool,
}

impl Aggregate {
    #[must_use]
    pub fn new(function: AggregateFunction, field: Option<Field>) -> Self {
        Self {
            function,
            field,
            distinct: false,
        }
    }

    #[must_use]
    pub fn count_all() -> Self {
        Self::new(AggregateFunction::Count, None)
    }

    #[must_use]
    pub fn count(field: Field) -> Self {
        Self::new(AggregateFunction::Count, Some(field))
    }

    #[must_use]
    pub fn sum(field: Field) -> Self {
        Self::new(AggregateFunction::Sum, Some(field))
    }

    #[must_use]
    pub fn avg(field: Field) -> Self {
        Self::new(AggregateFunction::Avg, Some(field))
    }

    #[must_use]
    pub fn min(field: Field) -> Self {
        Self::new(AggregateFunction::Min, Some(field))
    }

    #[must_use]
    pub fn max(field: Field) -> Self {
        Self::new(AggregateFunction::Max, Some(field))
    }

    #[must_use]
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }
}

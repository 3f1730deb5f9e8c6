//! Predicate queries over one collection.
//!
//! `Query` is evaluated twice: as SQL against stored rows, and in memory
//! against change events to decide whether a live query must refresh. Both
//! evaluations follow the same rules: equality compares JSON values, and
//! substring matching folds ASCII case only.

use serde_json::Value;

use super::document::{check_name, DocumentFields};
use super::{StoreError, StoreResult};

/// One predicate; a query matches when every filter matches.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `fields[field] == value`. A missing field only equals `Value::Null`.
    Eq { field: String, value: Value },
    /// Any of `fields` is a string containing `needle` (ASCII case folded).
    Contains { fields: Vec<String>, needle: String },
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn contains<I, S>(fields: I, needle: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Contains {
            fields: fields.into_iter().map(Into::into).collect(),
            needle: needle.into(),
        }
    }

    /// Evaluates the predicate against an in-memory document body.
    pub fn matches(&self, fields: &DocumentFields) -> bool {
        match self {
            Self::Eq { field, value } => match fields.get(field) {
                Some(current) => current == value,
                None => value.is_null(),
            },
            Self::Contains {
                fields: names,
                needle,
            } => {
                let needle = needle.to_ascii_lowercase();
                names.iter().any(|name| {
                    fields
                        .get(name)
                        .and_then(Value::as_str)
                        .is_some_and(|text| text.to_ascii_lowercase().contains(&needle))
                })
            }
        }
    }

    fn validate(&self) -> StoreResult<()> {
        match self {
            Self::Eq { field, value } => {
                check_name(field)?;
                if value.is_array() || value.is_object() {
                    return Err(StoreError::InvalidData(format!(
                        "equality filter on `{field}` must compare a scalar value"
                    )));
                }
                Ok(())
            }
            Self::Contains { fields, .. } => fields.iter().try_for_each(|name| check_name(name)),
        }
    }
}

/// Field a query orders by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderField {
    CreatedAt,
    UpdatedAt,
    Field(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: OrderField,
    pub direction: SortDirection,
}

impl OrderBy {
    pub fn desc(field: OrderField) -> Self {
        Self {
            field,
            direction: SortDirection::Descending,
        }
    }

    pub fn asc(field: OrderField) -> Self {
        Self {
            field,
            direction: SortDirection::Ascending,
        }
    }
}

/// Collection query: conjunction of filters plus an optional ordering.
///
/// Ties (and unordered queries) fall back to document id ascending so
/// results are deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order_by: Option<OrderBy>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, order_by: OrderBy) -> Self {
        self.order_by = Some(order_by);
        self
    }

    /// Returns whether every filter accepts `fields`.
    pub fn matches(&self, fields: &DocumentFields) -> bool {
        self.filters.iter().all(|filter| filter.matches(fields))
    }

    pub(crate) fn validate(&self) -> StoreResult<()> {
        self.filters.iter().try_for_each(Filter::validate)?;
        if let Some(OrderBy {
            field: OrderField::Field(name),
            ..
        }) = &self.order_by
        {
            check_name(name)?;
        }
        Ok(())
    }
}

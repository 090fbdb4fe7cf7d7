//! Query description for collection reads.
//!
//! A [`Query`] is applied in a fixed order: filter, then sort, then the
//! `offset`/`limit` slice. A query with no filter and no ordering returns
//! the collection in storage order.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::fmt;

use super::record::{to_object, Record};

/// Which records a read or a bulk delete applies to.
pub enum Filter<T> {
    /// Every listed field must equal the given JSON value.
    Equality(Map<String, Value>),
    /// An arbitrary predicate over the typed record.
    Predicate(Box<dyn Fn(&T) -> bool + Send + Sync>),
}

impl<T: Record> Filter<T> {
    /// Match records whose `field` equals `value`.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut map = Map::new();
        map.insert(field.into(), value.into());
        Self::Equality(map)
    }

    /// Add another field/value pair to an equality filter.
    ///
    /// On a predicate filter the extra equality is ANDed into the predicate.
    pub fn and_eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        let field = field.into();
        let value = value.into();
        match self {
            Self::Equality(mut map) => {
                map.insert(field, value);
                Self::Equality(map)
            }
            Self::Predicate(pred) => Self::Predicate(Box::new(move |item: &T| {
                pred(item) && to_object(item).get(&field).unwrap_or(&Value::Null) == &value
            })),
        }
    }

    /// Match records for which `predicate` returns true.
    pub fn predicate(predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        Self::Predicate(Box::new(predicate))
    }

    /// Whether a record passes this filter.
    pub fn matches(&self, item: &T) -> bool {
        match self {
            Self::Equality(fields) => {
                let obj = to_object(item);
                fields
                    .iter()
                    .all(|(k, v)| obj.get(k).unwrap_or(&Value::Null) == v)
            }
            Self::Predicate(pred) => pred(item),
        }
    }
}

impl<T> fmt::Debug for Filter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equality(map) => f.debug_tuple("Equality").field(map).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Sort key for a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub order: SortOrder,
}

/// Filter, ordering and pagination for [`PersistentStore::get_all`](super::PersistentStore::get_all).
#[derive(Debug)]
pub struct Query<T> {
    filter: Option<Filter<T>>,
    order_by: Option<OrderBy>,
    offset: usize,
    limit: Option<usize>,
}

impl<T: Record> Query<T> {
    /// An empty query (whole collection, storage order).
    pub fn new() -> Self {
        Self {
            filter: None,
            order_by: None,
            offset: 0,
            limit: None,
        }
    }

    /// Restrict results with a filter.
    pub fn filter(mut self, filter: Filter<T>) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Restrict results to records whose `field` equals `value`.
    pub fn where_eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        let filter = match self.filter {
            Some(existing) => existing.and_eq(field, value),
            None => Filter::eq(field, value),
        };
        Self {
            filter: Some(filter),
            ..self
        }
    }

    /// Restrict results with a predicate.
    pub fn where_fn(self, predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        self.filter(Filter::predicate(predicate))
    }

    /// Sort results by a top-level field.
    pub fn order_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            order,
        });
        self
    }

    /// Skip the first `offset` results.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Return at most `limit` results.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Apply the query to a collection snapshot.
    pub fn apply(&self, items: Vec<T>) -> Vec<T> {
        let mut matched: Vec<T> = match &self.filter {
            Some(filter) => items.into_iter().filter(|i| filter.matches(i)).collect(),
            None => items,
        };

        if let Some(order_by) = &self.order_by {
            let mut keyed: Vec<(Value, T)> = matched
                .into_iter()
                .map(|item| {
                    let key = to_object(&item)
                        .remove(&order_by.field)
                        .unwrap_or(Value::Null);
                    (key, item)
                })
                .collect();

            // sort_by is stable: ties keep storage order
            keyed.sort_by(|(a, _), (b, _)| {
                let ord = compare_values(a, b);
                match order_by.order {
                    SortOrder::Asc => ord,
                    SortOrder::Desc => ord.reverse(),
                }
            });
            matched = keyed.into_iter().map(|(_, item)| item).collect();
        }

        let iter = matched.into_iter().skip(self.offset);
        match self.limit {
            Some(limit) => iter.take(limit).collect(),
            None => iter.collect(),
        }
    }
}

impl<T: Record> Default for Query<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Total order over JSON values used for sorting.
///
/// `null < bool < number < string < array/object`. Strings that both parse
/// as RFC 3339 timestamps are compared as instants.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) | Value::Object(_) => 4,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => {
            match (
                x.parse::<DateTime<Utc>>().ok(),
                y.parse::<DateTime<Utc>>().ok(),
            ) {
                (Some(dx), Some(dy)) => dx.cmp(&dy),
                _ => x.cmp(y),
            }
        }
        _ => rank(a).cmp(&rank(b)),
    }
}

//! In-memory [`QueryEngine`] for tests, demos and embedded use.
//!
//! Rows are stored as JSON objects per table. Filters follow SQL
//! three-valued logic: a comparison with a null (or missing) column is
//! unknown, `NOT` of unknown stays unknown, and only rows that evaluate to
//! true match. Rows without a tenant reference never match a tenant
//! constraint.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

use parking_lot::RwLock;
use serde_json::{Map, Value};
use tracing::{Level, trace};

use crate::error::{QueryError, QueryResult};
use crate::filter::{Filter, FilterValue};
use crate::query::{SelectQuery, by_id_sql, count_sql};
use crate::traits::{BoxFuture, Model, QueryEngine};
use crate::types::{OrderBy, SortOrder};

type Row = Map<String, Value>;

#[derive(Debug, Default)]
struct Table {
    rows: Vec<Row>,
    next_id: i64,
}

/// A thread-safe in-memory engine. Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryEngine {
    tables: Arc<RwLock<HashMap<&'static str, Table>>>,
    offline: Arc<AtomicBool>,
}

impl MemoryEngine {
    /// Create an empty engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rows of `M`, regardless of tenant.
    pub fn len<M: Model>(&self) -> usize {
        self.tables
            .read()
            .get(M::TABLE_NAME)
            .map_or(0, |t| t.rows.len())
    }

    /// Whether no rows of `M` are stored.
    pub fn is_empty<M: Model>(&self) -> bool {
        self.len::<M>() == 0
    }

    /// Drop every table.
    pub fn clear(&self) {
        self.tables.write().clear();
    }

    /// Make every operation fail with a connection error while set.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, AtomicOrdering::SeqCst);
    }

    fn check_online(&self) -> QueryResult<()> {
        if self.offline.load(AtomicOrdering::SeqCst) {
            return Err(QueryError::connection("memory engine is offline"));
        }
        Ok(())
    }

    fn select<M: Model>(&self, query: &SelectQuery) -> QueryResult<Vec<M>> {
        self.check_online()?;
        if tracing::enabled!(Level::TRACE) {
            trace!(sql = %query.to_sql().0, "memory select");
        }

        let mut rows: Vec<Row> = {
            let tables = self.tables.read();
            match tables.get(query.table) {
                Some(table) => table
                    .rows
                    .iter()
                    .filter(|row| matches(row, &query.filter))
                    .cloned()
                    .collect(),
                None => Vec::new(),
            }
        };

        sort_rows(&mut rows, &query.order_by);

        let skip = usize::try_from(query.pagination.skip.unwrap_or(0)).unwrap_or(usize::MAX);
        let take = query
            .pagination
            .take
            .map_or(usize::MAX, |t| usize::try_from(t).unwrap_or(usize::MAX));

        rows.into_iter()
            .skip(skip)
            .take(take)
            .map(|row| serde_json::from_value(Value::Object(row)).map_err(QueryError::from))
            .collect()
    }

    fn select_by_id<M: Model>(&self, id: &FilterValue) -> QueryResult<Option<M>> {
        self.check_online()?;
        if tracing::enabled!(Level::TRACE) {
            trace!(sql = %by_id_sql(M::TABLE_NAME, M::PRIMARY_KEY, id).0, "memory select by id");
        }

        let tables = self.tables.read();
        let row = tables.get(M::TABLE_NAME).and_then(|table| {
            table
                .rows
                .iter()
                .find(|row| equals(row.get(M::PRIMARY_KEY), id) == Some(true))
                .cloned()
        });
        drop(tables);

        row.map(|row| serde_json::from_value(Value::Object(row)).map_err(QueryError::from))
            .transpose()
    }

    fn count_rows<M: Model>(&self, filter: &Filter) -> QueryResult<u64> {
        self.check_online()?;
        if tracing::enabled!(Level::TRACE) {
            trace!(sql = %count_sql(M::TABLE_NAME, filter).0, "memory count");
        }

        let tables = self.tables.read();
        let count = tables.get(M::TABLE_NAME).map_or(0, |table| {
            table.rows.iter().filter(|row| matches(row, filter)).count()
        });
        Ok(count as u64)
    }

    fn insert_row<M: Model>(&self, record: M) -> QueryResult<M> {
        self.check_online()?;

        let Value::Object(mut row) = serde_json::to_value(&record)? else {
            return Err(QueryError::serialization(format!(
                "{} does not serialize to an object",
                M::MODEL_NAME
            ))
            .with_model(M::MODEL_NAME));
        };

        let mut tables = self.tables.write();
        let table = tables.entry(M::TABLE_NAME).or_default();

        match row.get(M::PRIMARY_KEY).filter(|v| !v.is_null()) {
            Some(key) => {
                let key = FilterValue::from_json(key);
                if table
                    .rows
                    .iter()
                    .any(|existing| equals(existing.get(M::PRIMARY_KEY), &key) == Some(true))
                {
                    return Err(QueryError::unique_violation(M::MODEL_NAME, M::PRIMARY_KEY));
                }
                if let FilterValue::Int(id) = key {
                    table.next_id = table.next_id.max(id);
                }
            }
            None => {
                table.next_id += 1;
                row.insert(M::PRIMARY_KEY.to_string(), Value::from(table.next_id));
            }
        }

        table.rows.push(row.clone());
        drop(tables);

        trace!(table = M::TABLE_NAME, "memory insert");
        Ok(serde_json::from_value(Value::Object(row))?)
    }
}

impl QueryEngine for MemoryEngine {
    fn query_many<'a, M: Model>(
        &'a self,
        query: &'a SelectQuery,
    ) -> BoxFuture<'a, QueryResult<Vec<M>>> {
        Box::pin(async move { self.select::<M>(query) })
    }

    fn query_by_id<'a, M: Model>(
        &'a self,
        id: &'a FilterValue,
    ) -> BoxFuture<'a, QueryResult<Option<M>>> {
        Box::pin(async move { self.select_by_id::<M>(id) })
    }

    fn count<'a, M: Model>(&'a self, filter: &'a Filter) -> BoxFuture<'a, QueryResult<u64>> {
        Box::pin(async move { self.count_rows::<M>(filter) })
    }

    fn insert<M: Model>(&self, record: M) -> BoxFuture<'_, QueryResult<M>> {
        Box::pin(async move { self.insert_row::<M>(record) })
    }
}

fn column<'r>(row: &'r Row, name: &str) -> Option<&'r Value> {
    row.get(name).filter(|v| !v.is_null())
}

fn compare(left: &FilterValue, right: &FilterValue) -> Option<Ordering> {
    use FilterValue::*;

    match (left, right) {
        (Int(a), Int(b)) => Some(a.cmp(b)),
        (Int(a), Float(b)) => (*a as f64).partial_cmp(b),
        (Float(a), Int(b)) => a.partial_cmp(&(*b as f64)),
        (Float(a), Float(b)) => a.partial_cmp(b),
        (String(a), String(b)) => Some(a.cmp(b)),
        (Bool(a), Bool(b)) => Some(a.cmp(b)),
        (List(a), List(b)) if a == b => Some(Ordering::Equal),
        _ => None,
    }
}

/// SQL equality against a non-null value. Unknown when the cell is null.
fn equals(cell: Option<&Value>, value: &FilterValue) -> Option<bool> {
    let cell = cell.filter(|v| !v.is_null())?;
    Some(compare(&FilterValue::from_json(cell), value) == Some(Ordering::Equal))
}

fn compares(
    row: &Row,
    col: &str,
    value: &FilterValue,
    accept: fn(Ordering) -> bool,
) -> Option<bool> {
    let cell = column(row, col)?;
    Some(compare(&FilterValue::from_json(cell), value).is_some_and(accept))
}

fn matches(row: &Row, filter: &Filter) -> bool {
    eval(row, filter) == Some(true)
}

/// Three-valued evaluation: `None` is SQL `UNKNOWN`.
fn eval(row: &Row, filter: &Filter) -> Option<bool> {
    match filter {
        Filter::None => Some(true),

        Filter::Equals(col, value) if value.is_null() => Some(column(row, col).is_none()),
        Filter::Equals(col, value) => equals(row.get(col), value),
        Filter::NotEquals(col, value) if value.is_null() => Some(column(row, col).is_some()),
        Filter::NotEquals(col, value) => equals(row.get(col), value).map(|eq| !eq),

        Filter::Lt(col, value) => compares(row, col, value, Ordering::is_lt),
        Filter::Lte(col, value) => compares(row, col, value, Ordering::is_le),
        Filter::Gt(col, value) => compares(row, col, value, Ordering::is_gt),
        Filter::Gte(col, value) => compares(row, col, value, Ordering::is_ge),

        Filter::In(_, values) if values.is_empty() => Some(false),
        Filter::In(col, values) => {
            column(row, col)?;
            Some(values.iter().any(|v| equals(row.get(col), v) == Some(true)))
        }
        Filter::NotIn(_, values) if values.is_empty() => Some(true),
        Filter::NotIn(col, values) => {
            column(row, col)?;
            Some(!values.iter().any(|v| equals(row.get(col), v) == Some(true)))
        }

        Filter::Contains(col, value) => match (column(row, col)?, value) {
            (Value::String(cell), FilterValue::String(needle)) => {
                Some(cell.contains(needle.as_str()))
            }
            _ => Some(false),
        },

        Filter::IsNull(col) => Some(column(row, col).is_none()),
        Filter::IsNotNull(col) => Some(column(row, col).is_some()),

        Filter::And(filters) => {
            let mut result = Some(true);
            for filter in filters {
                match eval(row, filter) {
                    Some(false) => return Some(false),
                    None => result = None,
                    Some(true) => {}
                }
            }
            result
        }
        Filter::Or(filters) => {
            let mut result = Some(false);
            for filter in filters {
                match eval(row, filter) {
                    Some(true) => return Some(true),
                    None => result = None,
                    Some(false) => {}
                }
            }
            result
        }
        Filter::Not(inner) => eval(row, inner).map(|b| !b),
    }
}

/// Nulls sort after values in ascending order, before them in descending.
fn sort_rows(rows: &mut [Row], order_by: &OrderBy) {
    if order_by.is_empty() {
        return;
    }
    rows.sort_by(|a, b| {
        for field in order_by.fields() {
            let left = column(a, &field.column).map(FilterValue::from_json);
            let right = column(b, &field.column).map(FilterValue::from_json);
            let ordering = match (left, right) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(l), Some(r)) => compare(&l, &r).unwrap_or(Ordering::Equal),
            };
            let ordering = match field.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

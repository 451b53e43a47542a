//! The shaped select handed to a [`QueryEngine`](crate::QueryEngine).

use crate::filter::{Filter, FilterValue};
use crate::pagination::Pagination;
use crate::types::OrderBy;

/// A fully shaped select: table, filter (tenant constraint included),
/// ordering and pagination.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    /// Table to read from.
    pub table: &'static str,
    /// The complete WHERE condition.
    pub filter: Filter,
    /// Ordering applied before pagination.
    pub order_by: OrderBy,
    /// LIMIT/OFFSET, applied last.
    pub pagination: Pagination,
}

impl SelectQuery {
    /// Create an unfiltered select over `table`.
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            filter: Filter::None,
            order_by: OrderBy::none(),
            pagination: Pagination::new(),
        }
    }

    /// Replace the filter.
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// Replace the ordering.
    pub fn with_order_by(mut self, order_by: OrderBy) -> Self {
        self.order_by = order_by;
        self
    }

    /// Replace the pagination.
    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }

    /// Build the SQL for this select.
    ///
    /// The WHERE clause always precedes LIMIT/OFFSET, so a page is cut from
    /// the already constrained set.
    pub fn to_sql(&self) -> (String, Vec<FilterValue>) {
        let mut sql = String::from("SELECT * FROM ");
        sql.push_str(self.table);

        let (where_sql, params) = self.filter.to_sql(0);
        if !self.filter.is_none() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_sql);
        }

        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_by.to_sql());
        }

        let pagination_sql = self.pagination.to_sql();
        if !pagination_sql.is_empty() {
            sql.push(' ');
            sql.push_str(&pagination_sql);
        }

        (sql, params)
    }

    /// Build the matching `SELECT COUNT(*)`, ignoring ordering and pagination.
    pub fn to_count_sql(&self) -> (String, Vec<FilterValue>) {
        count_sql(self.table, &self.filter)
    }
}

/// Build a `SELECT COUNT(*)` over `table` with `filter`.
pub fn count_sql(table: &str, filter: &Filter) -> (String, Vec<FilterValue>) {
    let mut sql = String::from("SELECT COUNT(*) FROM ");
    sql.push_str(table);
    let (where_sql, params) = filter.to_sql(0);
    if !filter.is_none() {
        sql.push_str(" WHERE ");
        sql.push_str(&where_sql);
    }
    (sql, params)
}

/// Build a primary-key lookup over `table`.
pub fn by_id_sql(table: &str, primary_key: &str, id: &FilterValue) -> (String, Vec<FilterValue>) {
    (
        format!("SELECT * FROM {} WHERE {} = $1 LIMIT 1", table, primary_key),
        vec![id.clone()],
    )
}

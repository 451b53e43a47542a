//! FindFirst operation for finding the first matching record.

use std::marker::PhantomData;

use tracing::debug;

use crate::error::QueryResult;
use crate::filter::{Filter, FilterValue};
use crate::pagination::Pagination;
use crate::query::SelectQuery;
use crate::tenant::context;
use crate::tenant::isolation::constrain;
use crate::tenant::model::TenantState;
use crate::traits::{Model, QueryEngine};
use crate::types::OrderBy;

/// A query operation that finds the first record matching the filter.
///
/// # Example
///
/// ```rust,ignore
/// let newest = engine
///     .repository::<Charge>()
///     .find_first()
///     .order_by(OrderByField::desc("issued_at"))
///     .exec()
///     .await?;
/// ```
pub struct FindFirstOperation<E: QueryEngine, M: Model> {
    engine: E,
    filter: Filter,
    order_by: OrderBy,
    _model: PhantomData<M>,
}

impl<E: QueryEngine, M: Model> FindFirstOperation<E, M> {
    /// Create a new FindFirst operation.
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            filter: Filter::None,
            order_by: OrderBy::none(),
            _model: PhantomData,
        }
    }

    /// Add a filter condition.
    pub fn r#where(mut self, filter: impl Into<Filter>) -> Self {
        self.filter = self.filter.and_then(filter.into());
        self
    }

    /// Set the order by clause.
    pub fn order_by(mut self, order: impl Into<OrderBy>) -> Self {
        self.order_by = order.into();
        self
    }

    /// The select this operation runs under `state`.
    pub fn query_for(&self, state: &TenantState) -> SelectQuery {
        SelectQuery::new(M::TABLE_NAME)
            .with_filter(constrain::<M>(state, self.filter.clone()))
            .with_order_by(self.order_by.clone())
            .with_pagination(Pagination::first(1))
    }

    /// Build the SQL query for the current tenant context.
    pub fn build_sql(&self) -> (String, Vec<FilterValue>) {
        self.query_for(&context::current()).to_sql()
    }

    /// Execute the query.
    pub async fn exec(self) -> QueryResult<Option<M>> {
        let query = self.query_for(&context::current());
        debug!(model = M::MODEL_NAME, "find_first");
        let rows = self.engine.query_many::<M>(&query).await?;
        Ok(rows.into_iter().next())
    }
}

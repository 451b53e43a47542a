//! FindUnique and FindOne operations for at-most-one and exactly-one reads.

use std::marker::PhantomData;

use tracing::debug;

use crate::error::{QueryError, QueryResult};
use crate::filter::{Filter, FilterValue};
use crate::pagination::Pagination;
use crate::query::SelectQuery;
use crate::tenant::context;
use crate::tenant::isolation::constrain;
use crate::tenant::model::TenantState;
use crate::traits::{Model, QueryEngine};

/// A query operation expecting at most one matching record.
///
/// No match gives `None`; more than one gives a not-unique error. Rows of
/// other tenants are not counted.
///
/// ```rust,ignore
/// let user = engine
///     .repository::<User>()
///     .find_unique()
///     .r#where(Filter::equals("email", "admin@algarrobos.cl"))
///     .exec()
///     .await?;
/// ```
pub struct FindUniqueOperation<E: QueryEngine, M: Model> {
    engine: E,
    filter: Filter,
    _model: PhantomData<M>,
}

impl<E: QueryEngine, M: Model> FindUniqueOperation<E, M> {
    /// Create a new FindUnique operation.
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            filter: Filter::None,
            _model: PhantomData,
        }
    }

    /// Add a filter condition.
    pub fn r#where(mut self, filter: impl Into<Filter>) -> Self {
        self.filter = self.filter.and_then(filter.into());
        self
    }

    /// The select this operation runs under `state`. Two rows are enough to
    /// tell "one" from "several".
    pub fn query_for(&self, state: &TenantState) -> SelectQuery {
        SelectQuery::new(M::TABLE_NAME)
            .with_filter(constrain::<M>(state, self.filter.clone()))
            .with_pagination(Pagination::first(2))
    }

    /// Build the SQL query for the current tenant context.
    pub fn build_sql(&self) -> (String, Vec<FilterValue>) {
        self.query_for(&context::current()).to_sql()
    }

    /// Execute the query.
    pub async fn exec(self) -> QueryResult<Option<M>> {
        let query = self.query_for(&context::current());
        debug!(model = M::MODEL_NAME, "find_unique");
        let mut rows = self.engine.query_many::<M>(&query).await?;
        match rows.len() {
            0 => Ok(None),
            1 => Ok(rows.pop()),
            _ => Err(QueryError::not_unique(M::MODEL_NAME)),
        }
    }
}

/// A query operation expecting exactly one matching record.
///
/// No match (including a match owned by another tenant) is a not-found
/// error.
pub struct FindOneOperation<E: QueryEngine, M: Model> {
    inner: FindUniqueOperation<E, M>,
}

impl<E: QueryEngine, M: Model> FindOneOperation<E, M> {
    /// Create a new FindOne operation.
    pub fn new(engine: E) -> Self {
        Self {
            inner: FindUniqueOperation::new(engine),
        }
    }

    /// Add a filter condition.
    pub fn r#where(mut self, filter: impl Into<Filter>) -> Self {
        self.inner = self.inner.r#where(filter);
        self
    }

    /// Build the SQL query for the current tenant context.
    pub fn build_sql(&self) -> (String, Vec<FilterValue>) {
        self.inner.build_sql()
    }

    /// Execute the query.
    pub async fn exec(self) -> QueryResult<M> {
        self.inner
            .exec()
            .await?
            .ok_or_else(|| QueryError::not_found(M::MODEL_NAME))
    }
}

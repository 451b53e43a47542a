//! Count operation for counting records.

use std::marker::PhantomData;

use tracing::debug;

use crate::error::QueryResult;
use crate::filter::{Filter, FilterValue};
use crate::query::count_sql;
use crate::tenant::context;
use crate::tenant::isolation::constrain;
use crate::tenant::model::TenantState;
use crate::traits::{Model, QueryEngine};

/// A count operation.
///
/// # Example
///
/// ```rust,ignore
/// let residents = engine
///     .repository::<User>()
///     .count()
///     .r#where(Filter::equals("role", "RESIDENT"))
///     .exec()
///     .await?;
/// ```
pub struct CountOperation<E: QueryEngine, M: Model> {
    engine: E,
    filter: Filter,
    _model: PhantomData<M>,
}

impl<E: QueryEngine, M: Model> CountOperation<E, M> {
    /// Create a new Count operation.
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

    /// The filter this operation counts with under `state`.
    pub fn filter_for(&self, state: &TenantState) -> Filter {
        constrain::<M>(state, self.filter.clone())
    }

    /// Build the SQL query for the current tenant context.
    pub fn build_sql(&self) -> (String, Vec<FilterValue>) {
        count_sql(M::TABLE_NAME, &self.filter_for(&context::current()))
    }

    /// Execute the count query.
    pub async fn exec(self) -> QueryResult<u64> {
        let filter = self.filter_for(&context::current());
        debug!(model = M::MODEL_NAME, "count");
        self.engine.count::<M>(&filter).await
    }
}

//! FindById operation for primary-key lookups.

use std::marker::PhantomData;

use tracing::debug;

use crate::error::{QueryError, QueryResult};
use crate::filter::FilterValue;
use crate::query::by_id_sql;
use crate::tenant::context;
use crate::tenant::isolation::admit;
use crate::traits::{Model, QueryEngine};

/// Load a record by primary key.
///
/// The lookup itself carries no tenant condition; the loaded record is then
/// checked against the tenant that was active when `exec` was called. A
/// record owned by another tenant comes back as `None`, exactly like an id
/// that does not exist.
pub struct FindByIdOperation<E: QueryEngine, M: Model> {
    engine: E,
    id: FilterValue,
    _model: PhantomData<M>,
}

impl<E: QueryEngine, M: Model> FindByIdOperation<E, M> {
    /// Create a new FindById operation.
    pub fn new(engine: E, id: impl Into<FilterValue>) -> Self {
        Self {
            engine,
            id: id.into(),
            _model: PhantomData,
        }
    }

    /// Build the SQL query.
    pub fn build_sql(&self) -> (String, Vec<FilterValue>) {
        by_id_sql(M::TABLE_NAME, M::PRIMARY_KEY, &self.id)
    }

    /// Execute the query.
    pub async fn exec(self) -> QueryResult<Option<M>> {
        let state = context::current();
        debug!(model = M::MODEL_NAME, "find_by_id");
        let record = self.engine.query_by_id::<M>(&self.id).await?;
        Ok(admit(&state, record))
    }

    /// Execute the query, turning `None` into a not-found error.
    pub async fn exec_or_not_found(self) -> QueryResult<M> {
        self.exec()
            .await?
            .ok_or_else(|| QueryError::not_found(M::MODEL_NAME))
    }
}

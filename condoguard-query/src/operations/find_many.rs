//! FindMany operation for querying multiple records.

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

/// A query operation that finds multiple records.
///
/// Under an active tenant, tenant-scoped models only return that tenant's
/// rows.
///
/// # Example
///
/// ```rust,ignore
/// let admins = engine
///     .repository::<User>()
///     .find_many()
///     .r#where(Filter::equals("role", "ADMIN"))
///     .order_by(OrderByField::asc("email"))
///     .take(10)
///     .exec()
///     .await?;
/// ```
pub struct FindManyOperation<E: QueryEngine, M: Model> {
    engine: E,
    filter: Filter,
    order_by: OrderBy,
    pagination: Pagination,
    _model: PhantomData<M>,
}

impl<E: QueryEngine, M: Model> FindManyOperation<E, M> {
    /// Create a new FindMany operation.
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            filter: Filter::None,
            order_by: OrderBy::none(),
            pagination: Pagination::new(),
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

    /// Skip a number of records.
    pub fn skip(mut self, n: u64) -> Self {
        self.pagination = self.pagination.skip(n);
        self
    }

    /// Take a limited number of records.
    pub fn take(mut self, n: u64) -> Self {
        self.pagination = self.pagination.take(n);
        self
    }

    /// The select this operation runs under `state`.
    pub fn query_for(&self, state: &TenantState) -> SelectQuery {
        SelectQuery::new(M::TABLE_NAME)
            .with_filter(constrain::<M>(state, self.filter.clone()))
            .with_order_by(self.order_by.clone())
            .with_pagination(self.pagination.clone())
    }

    /// Build the SQL query for the current tenant context.
    pub fn build_sql(&self) -> (String, Vec<FilterValue>) {
        self.query_for(&context::current()).to_sql()
    }

    /// Execute the query.
    pub async fn exec(self) -> QueryResult<Vec<M>> {
        let query = self.query_for(&context::current());
        debug!(model = M::MODEL_NAME, "find_many");
        self.engine.query_many::<M>(&query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::fixtures::{Module, User, seeded, t1, t2};
    use crate::tenant::context::with_tenant;
    use crate::types::OrderByField;
    use pretty_assertions::assert_eq;

    fn emails(users: &[User]) -> Vec<&str> {
        users.iter().map(|u| u.email.as_str()).collect()
    }

    #[tokio::test]
    async fn test_find_many_is_confined_to_active_tenant() {
        let engine = seeded().await;
        let op = || {
            FindManyOperation::<_, User>::new(engine.clone()).order_by(OrderByField::asc("id"))
        };

        let t1_users = with_tenant(t1(), op().exec()).await.unwrap();
        assert_eq!(emails(&t1_users), vec!["admin@t1.cl", "owner@t1.cl"]);

        let t2_users = with_tenant(t2(), op().exec()).await.unwrap();
        assert_eq!(emails(&t2_users), vec!["admin@t2.cl"]);

        let everyone = op().exec().await.unwrap();
        assert_eq!(everyone.len(), 4);
    }

    #[tokio::test]
    async fn test_caller_filter_is_combined_with_tenant() {
        let engine = seeded().await;
        let admins = with_tenant(
            t1(),
            FindManyOperation::<_, User>::new(engine)
                .r#where(Filter::equals("role", "ADMIN"))
                .exec(),
        )
        .await
        .unwrap();
        assert_eq!(emails(&admins), vec!["admin@t1.cl"]);
    }

    #[tokio::test]
    async fn test_caller_cannot_widen_past_tenant() {
        let engine = seeded().await;
        let leaked = with_tenant(
            t1(),
            FindManyOperation::<_, User>::new(engine)
                .r#where(Filter::equals("condominium_id", "2"))
                .exec(),
        )
        .await
        .unwrap();
        assert!(leaked.is_empty());
    }

    #[tokio::test]
    async fn test_global_models_ignore_tenant() {
        let engine = seeded().await;
        let modules = with_tenant(t1(), FindManyOperation::<_, Module>::new(engine).exec())
            .await
            .unwrap();
        assert_eq!(modules.len(), 2);
    }

    #[tokio::test]
    async fn test_build_sql_carries_constraint_before_limit() {
        let engine = seeded().await;
        let op = FindManyOperation::<_, User>::new(engine)
            .r#where(Filter::equals("role", "ADMIN"))
            .skip(5)
            .take(5);

        let (sql, params) = with_tenant(t1(), async { op.build_sql() }).await;
        assert_eq!(
            sql,
            "SELECT * FROM users WHERE (condominium_id = $1 AND role = $2) LIMIT 5 OFFSET 5"
        );
        assert_eq!(params, vec![FilterValue::from("1"), FilterValue::from("ADMIN")]);

        let (sql, _) = op.build_sql();
        assert_eq!(sql, "SELECT * FROM users WHERE role = $1 LIMIT 5 OFFSET 5");
    }
}

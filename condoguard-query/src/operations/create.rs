//! Create operation for inserting new records.

use tracing::debug;

use crate::error::{QueryError, QueryResult};
use crate::filter::FilterValue;
use crate::tenant::injector::{Stamp, stamp};
use crate::tenant::{context, model::TenantState};
use crate::traits::{Model, QueryEngine};

/// Insert a record.
///
/// A tenant-scoped record created without an owner is assigned the active
/// tenant first; an owner set by the caller is kept as is.
///
/// # Example
///
/// ```rust,ignore
/// let unit = engine
///     .repository::<Unit>()
///     .create(Unit::new("B-1204"))
///     .exec()
///     .await?;
/// ```
pub struct CreateOperation<E: QueryEngine, M: Model> {
    engine: E,
    record: M,
}

impl<E: QueryEngine, M: Model> CreateOperation<E, M> {
    /// Create a new Create operation.
    pub fn new(engine: E, record: M) -> Self {
        Self { engine, record }
    }

    /// The record as it would be inserted under `state`.
    pub fn prepared_for(&self, state: &TenantState) -> (M, Stamp) {
        let mut record = self.record.clone();
        let outcome = stamp(&mut record, state);
        (record, outcome)
    }

    /// Build the INSERT for the current tenant context.
    ///
    /// Columns are the record's serialized fields; a null primary key is
    /// left out for the store to assign.
    pub fn build_sql(&self) -> QueryResult<(String, Vec<FilterValue>)> {
        let (record, _) = self.prepared_for(&context::current());
        let serde_json::Value::Object(fields) = serde_json::to_value(&record)? else {
            return Err(QueryError::serialization(format!(
                "{} does not serialize to an object",
                M::MODEL_NAME
            ))
            .with_model(M::MODEL_NAME));
        };

        let mut columns = Vec::with_capacity(fields.len());
        let mut params = Vec::with_capacity(fields.len());
        for (column, value) in &fields {
            if column == M::PRIMARY_KEY && value.is_null() {
                continue;
            }
            columns.push(column.as_str());
            params.push(FilterValue::from_json(value));
        }

        let placeholders: Vec<_> = (1..=params.len()).map(|i| format!("${}", i)).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING *",
            M::TABLE_NAME,
            columns.join(", "),
            placeholders.join(", ")
        );
        Ok((sql, params))
    }

    /// Execute the insert and return the stored record.
    pub async fn exec(self) -> QueryResult<M> {
        let (record, outcome) = self.prepared_for(&context::current());
        debug!(model = M::MODEL_NAME, stamp = ?outcome, "create");
        self.engine.insert(record).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryEngine;
    use crate::operations::fixtures::{Module, User, t1, t2};
    use crate::tenant::TenantId;
    use crate::tenant::context::with_tenant;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_create_injects_active_tenant() {
        let engine = MemoryEngine::new();
        let created = with_tenant(
            t1(),
            CreateOperation::new(engine.clone(), User::new("new@t1.cl", "OWNER")).exec(),
        )
        .await
        .unwrap();

        assert_eq!(created.condominium_id, Some(TenantId::from(1_i64)));
        assert_eq!(created.id, Some(1));
    }

    #[tokio::test]
    async fn test_explicit_tenant_wins() {
        let engine = MemoryEngine::new();
        let created = with_tenant(
            t1(),
            CreateOperation::new(engine, User::new("x@t2.cl", "OWNER").owned_by(2)).exec(),
        )
        .await
        .unwrap();
        assert_eq!(created.condominium_id, Some(TenantId::from(2_i64)));
    }

    #[tokio::test]
    async fn test_no_context_leaves_tenant_unset() {
        let engine = MemoryEngine::new();
        let created = CreateOperation::new(engine, User::new("x@nowhere.cl", "OWNER"))
            .exec()
            .await
            .unwrap();
        assert_eq!(created.condominium_id, None);
    }

    #[tokio::test]
    async fn test_prepared_reports_stamp() {
        let op = CreateOperation::new(
            MemoryEngine::new(),
            Module {
                id: None,
                code: "finance".into(),
            },
        );
        let state = TenantState::from(t2());
        assert_eq!(op.prepared_for(&state).1, Stamp::Global);
    }

    #[tokio::test]
    async fn test_build_sql_includes_injected_tenant() {
        let op = CreateOperation::new(MemoryEngine::new(), User::new("a@t2.cl", "ADMIN"));
        let (sql, params) = with_tenant(t2(), async { op.build_sql() }).await.unwrap();
        assert_eq!(
            sql,
            "INSERT INTO users (condominium_id, email, role) VALUES ($1, $2, $3) RETURNING *"
        );
        assert_eq!(
            params,
            vec![
                FilterValue::from("2"),
                FilterValue::from("a@t2.cl"),
                FilterValue::from("ADMIN"),
            ]
        );
    }
}

//! Core traits: models, their tenancy scope, and the storage engine seam.
//!
//! Whether a model is tenant-scoped is decided by its `Scope` associated
//! type, so the check is a property of the type and costs nothing per call:
//!
//! ```rust
//! use condoguard_query::{FilterValue, Global, Model, Scoped, TenantId, TenantScoped};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Clone, Serialize, Deserialize)]
//! struct Unit {
//!     id: Option<i64>,
//!     condominium_id: Option<TenantId>,
//!     property_number: String,
//! }
//!
//! impl Model for Unit {
//!     const MODEL_NAME: &'static str = "Unit";
//!     const TABLE_NAME: &'static str = "units";
//!     type Scope = Scoped;
//!
//!     fn id(&self) -> FilterValue {
//!         self.id.into()
//!     }
//! }
//!
//! impl TenantScoped for Unit {
//!     fn tenant_id(&self) -> Option<&TenantId> {
//!         self.condominium_id.as_ref()
//!     }
//!
//!     fn set_tenant_id(&mut self, tenant: TenantId) {
//!         self.condominium_id = Some(tenant);
//!     }
//! }
//!
//! #[derive(Clone, Serialize, Deserialize)]
//! struct Module {
//!     id: Option<i64>,
//!     code: String,
//! }
//!
//! impl Model for Module {
//!     const MODEL_NAME: &'static str = "Module";
//!     const TABLE_NAME: &'static str = "modules";
//!     type Scope = Global;
//!
//!     fn id(&self) -> FilterValue {
//!         self.id.into()
//!     }
//! }
//! ```

use std::future::Future;
use std::pin::Pin;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::TenancyConfig;
use crate::error::QueryResult;
use crate::filter::{Filter, FilterValue};
use crate::query::SelectQuery;
use crate::repository::Repository;
use crate::tenant::TenantId;

/// A boxed future, as returned by [`QueryEngine`] methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A persisted record type.
pub trait Model: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// The model name, used in errors and logs.
    const MODEL_NAME: &'static str;
    /// The database table name.
    const TABLE_NAME: &'static str;
    /// The primary key column.
    const PRIMARY_KEY: &'static str = "id";

    /// Tenancy of this model: [`Scoped`] or [`Global`].
    type Scope: Scope<Self>;

    /// The primary key value; [`FilterValue::Null`] before the first insert.
    fn id(&self) -> FilterValue;
}

/// Accessors for the tenant reference of a tenant-scoped model.
pub trait TenantScoped {
    /// The column holding the tenant reference.
    const TENANT_COLUMN: &'static str = "condominium_id";

    /// The owning tenant, or `None` when unset.
    fn tenant_id(&self) -> Option<&TenantId>;

    /// Assign the owning tenant.
    fn set_tenant_id(&mut self, tenant: TenantId);
}

/// Static tenancy capability of a model type.
///
/// Implemented only by the two marker types [`Scoped`] and [`Global`].
pub trait Scope<M>: Send + Sync + 'static {
    /// The tenant column, or `None` for global models.
    const COLUMN: Option<&'static str>;

    /// The record's tenant reference. Always `None` for global models.
    fn tenant_of(record: &M) -> Option<&TenantId>;

    /// Set the record's tenant reference. A no-op for global models.
    fn assign(record: &mut M, tenant: TenantId);
}

/// Marker for models that carry a tenant reference.
#[derive(Debug)]
pub enum Scoped {}

/// Marker for models that are shared by every tenant.
#[derive(Debug)]
pub enum Global {}

impl<M: TenantScoped> Scope<M> for Scoped {
    const COLUMN: Option<&'static str> = Some(M::TENANT_COLUMN);

    fn tenant_of(record: &M) -> Option<&TenantId> {
        record.tenant_id()
    }

    fn assign(record: &mut M, tenant: TenantId) {
        record.set_tenant_id(tenant);
    }
}

impl<M> Scope<M> for Global {
    const COLUMN: Option<&'static str> = None;

    fn tenant_of(_record: &M) -> Option<&TenantId> {
        None
    }

    fn assign(_record: &mut M, _tenant: TenantId) {}
}

/// Whether `M` is tenant-scoped.
#[inline]
pub fn is_tenant_scoped<M: Model>() -> bool {
    <M::Scope as Scope<M>>::COLUMN.is_some()
}

/// The storage seam. Implementations execute already-shaped operations.
///
/// Engines never look at the tenant context: by the time a query reaches
/// them, the tenant constraint is part of its filter.
pub trait QueryEngine: Clone + Send + Sync + 'static {
    /// Execute a select and return every matching record.
    fn query_many<'a, M: Model>(
        &'a self,
        query: &'a SelectQuery,
    ) -> BoxFuture<'a, QueryResult<Vec<M>>>;

    /// Load a record by primary key, without any other condition.
    fn query_by_id<'a, M: Model>(
        &'a self,
        id: &'a FilterValue,
    ) -> BoxFuture<'a, QueryResult<Option<M>>>;

    /// Count the records matching `filter`.
    fn count<'a, M: Model>(&'a self, filter: &'a Filter) -> BoxFuture<'a, QueryResult<u64>>;

    /// Insert a record and return it as stored (with its primary key).
    fn insert<M: Model>(&self, record: M) -> BoxFuture<'_, QueryResult<M>>;

    /// Get a repository for `M` backed by this engine.
    fn repository<M: Model>(&self) -> Repository<M, Self>
    where
        Self: Sized,
    {
        Repository::new(self.clone())
    }

    /// Get a repository for `M` with the limits in `config`.
    fn repository_with<M: Model>(&self, config: &TenancyConfig) -> Repository<M, Self>
    where
        Self: Sized,
    {
        Repository::from_config(self.clone(), config)
    }
}

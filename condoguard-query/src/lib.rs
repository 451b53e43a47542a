//! # condoguard-query
//!
//! Tenant-scoped data access for multi-condominium services.
//!
//! Many condominiums share one store; every tenant-owned row carries a
//! reference to its condominium. This crate makes sure a request acting for
//! one condominium can neither read nor accidentally write another's rows:
//!
//! - **Tenant context**: the active tenant of the current request, held in
//!   task-local storage ([`tenant::with_tenant`], [`tenant::current_tenant`])
//! - **Tenant resolver**: request host (or, outside production, an override
//!   parameter) to tenant, via a [`TenantDirectory`]
//! - **Scoped repository**: reads through [`Repository`] are confined to the
//!   active tenant; primary-key reads of foreign rows look like missing rows
//! - **Auto-tenant injection**: records created without an owner inherit the
//!   active tenant
//!
//! Whether a model is tenant-scoped is part of its type
//! (`Model::Scope = Scoped` or `Global`).
//!
//! ## Example
//!
//! ```rust
//! use condoguard_query::prelude::*;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! struct Unit {
//!     id: Option<i64>,
//!     condominium_id: Option<TenantId>,
//!     number: String,
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
//! # #[tokio::main]
//! # async fn main() -> QueryResult<()> {
//! let engine = MemoryEngine::new();
//! let units = engine.repository::<Unit>();
//! let algarrobos = Tenant::new(1_i64, "algarrobos");
//! let puntablanca = Tenant::new(2_i64, "puntablanca");
//!
//! let unit = with_tenant(algarrobos.clone(), async {
//!     units
//!         .create(Unit { id: None, condominium_id: None, number: "B-1204".into() })
//!         .exec()
//!         .await
//! })
//! .await?;
//! assert_eq!(unit.condominium_id, Some(TenantId::from(1_i64)));
//!
//! let id = unit.id.unwrap_or_default();
//! let seen_by_owner = with_tenant(algarrobos, units.find_by_id(id).exec()).await?;
//! let seen_by_other = with_tenant(puntablanca, units.find_by_id(id).exec()).await?;
//! assert!(seen_by_owner.is_some());
//! assert!(seen_by_other.is_none());
//! # Ok(())
//! # }
//! ```
//!
//! ## Filters
//!
//! ```rust
//! use condoguard_query::{Filter, FilterValue};
//!
//! let filter = Filter::and([
//!     Filter::equals("tower", "B"),
//!     Filter::Gt("floor".into(), FilterValue::Int(10)),
//! ]);
//! let (sql, params) = filter.to_sql(0);
//! assert_eq!(sql, "(tower = $1 AND floor > $2)");
//! assert_eq!(params.len(), 2);
//! ```

pub mod config;
pub mod error;
pub mod filter;
pub mod logging;
pub mod memory;
pub mod operations;
pub mod pagination;
pub mod query;
pub mod repository;
pub mod tenant;
pub mod traits;
pub mod types;

pub use config::{DeploymentMode, DirectoryCacheSettings, TenancyConfig, TenancyConfigBuilder};
pub use error::{ErrorCode, ErrorContext, QueryError, QueryResult};
pub use filter::{Filter, FilterValue};
pub use memory::MemoryEngine;
pub use operations::{
    CountOperation, CreateOperation, FindByIdOperation, FindFirstOperation, FindManyOperation,
    FindOneOperation, FindUniqueOperation, PaginateOperation,
};
pub use pagination::{Page, Pagination};
pub use query::SelectQuery;
pub use repository::Repository;
pub use traits::{BoxFuture, Global, Model, QueryEngine, Scope, Scoped, TenantScoped, is_tenant_scoped};
pub use types::{OrderBy, OrderByField, SortOrder};

// Re-export tenant types
pub use tenant::{
    CacheConfig, CachedDirectory, DynamicDirectory, EngineDirectory, OriginPolicy, RequestInfo,
    StaticDirectory, Tenant, TenantDirectory, TenantEnvironment, TenantId, TenantResolver,
    TenantState, TenantStatus,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::{DeploymentMode, TenancyConfig};
    pub use crate::error::{QueryError, QueryResult};
    pub use crate::filter::{Filter, FilterValue};
    pub use crate::memory::MemoryEngine;
    pub use crate::operations::*;
    pub use crate::pagination::{Page, Pagination};
    pub use crate::repository::Repository;
    pub use crate::traits::{Global, Model, QueryEngine, Scoped, TenantScoped};
    pub use crate::types::{OrderBy, OrderByField, SortOrder};

    // Tenant types
    pub use crate::tenant::{
        RequestInfo, Tenant, TenantDirectory, TenantId, TenantResolver, TenantState,
        current_tenant, require_tenant, with_state, with_tenant, without_tenant,
    };
}

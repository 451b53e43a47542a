//! Multi-tenancy: who the current condominium is, and how reads and writes
//! are confined to it.
//!
//! - [`model`]: [`Tenant`], [`TenantId`] and the per-request [`TenantState`]
//! - [`context`]: task-local (and guarded thread-local) tenant context
//! - [`resolver`]: host/override to [`TenantState`] resolution
//! - [`directory`] and [`cache`]: tenant lookup by subdomain
//! - [`isolation`]: read constraints for tenant-scoped models
//! - [`injector`]: tenant stamping for new records
//!
//! ```rust,ignore
//! use condoguard_query::tenant::{RequestInfo, StaticDirectory, TenantResolver, with_state};
//!
//! let resolver = TenantResolver::new(directory, config);
//! let state = resolver.resolve(&RequestInfo::new("algarrobos.condo.app")).await?;
//! with_state(state, handle_request()).await
//! ```

pub mod cache;
pub mod context;
pub mod directory;
pub mod host;
pub mod injector;
pub mod isolation;
pub mod model;
pub mod resolver;

pub use cache::{CacheConfig, CacheMetrics, CachedDirectory};
pub use context::{
    ContextGuard, activate_sync, clear_sync, current, current_environment, current_tenant,
    current_tenant_id, has_tenant, in_current_scope, require_tenant, with_state, with_tenant,
    without_tenant,
};
pub use directory::{DynamicDirectory, EngineDirectory, StaticDirectory, TenantDirectory};
pub use injector::Stamp;
pub use model::{Tenant, TenantEnvironment, TenantId, TenantState, TenantStatus};
pub use resolver::{OriginPolicy, RequestInfo, TenantResolver};

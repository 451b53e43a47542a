//! Tenant directories: lookup of tenant records by subdomain.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use parking_lot::RwLock;

use super::model::Tenant;
use crate::error::QueryResult;
use crate::filter::Filter;
use crate::traits::{BoxFuture, QueryEngine};

/// Read-only lookup of tenants by public subdomain.
///
/// `Ok(None)` means no such tenant. Errors are store failures and are
/// propagated unchanged by the resolver.
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    /// Find the tenant registered under `subdomain` (lowercase).
    async fn find_by_subdomain(&self, subdomain: &str) -> QueryResult<Option<Tenant>>;
}

#[async_trait]
impl<D: TenantDirectory + ?Sized> TenantDirectory for Arc<D> {
    async fn find_by_subdomain(&self, subdomain: &str) -> QueryResult<Option<Tenant>> {
        (**self).find_by_subdomain(subdomain).await
    }
}

/// An in-process directory keyed by subdomain.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    tenants: Arc<RwLock<HashMap<String, Tenant>>>,
}

impl StaticDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a directory holding `tenants`.
    pub fn from_tenants(tenants: impl IntoIterator<Item = Tenant>) -> Self {
        let directory = Self::new();
        for tenant in tenants {
            directory.register(tenant);
        }
        directory
    }

    /// Register a tenant under its subdomain, replacing any previous entry.
    pub fn register(&self, tenant: Tenant) -> &Self {
        self.tenants
            .write()
            .insert(tenant.subdomain.to_ascii_lowercase(), tenant);
        self
    }

    /// Remove a tenant.
    pub fn unregister(&self, subdomain: &str) -> Option<Tenant> {
        self.tenants.write().remove(&subdomain.to_ascii_lowercase())
    }

    /// Check if a subdomain is registered.
    pub fn contains(&self, subdomain: &str) -> bool {
        self.tenants
            .read()
            .contains_key(&subdomain.to_ascii_lowercase())
    }

    /// Get the number of registered tenants.
    pub fn len(&self) -> usize {
        self.tenants.read().len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TenantDirectory for StaticDirectory {
    async fn find_by_subdomain(&self, subdomain: &str) -> QueryResult<Option<Tenant>> {
        Ok(self
            .tenants
            .read()
            .get(&subdomain.to_ascii_lowercase())
            .cloned())
    }
}

/// Type alias for async lookup functions.
pub type LookupFn =
    Arc<dyn Fn(String) -> BoxFuture<'static, QueryResult<Option<Tenant>>> + Send + Sync>;

/// A directory backed by a callback.
pub struct DynamicDirectory {
    lookup: LookupFn,
}

impl DynamicDirectory {
    /// Create a directory from an async lookup function.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = QueryResult<Option<Tenant>>> + Send + 'static,
    {
        Self {
            lookup: Arc::new(move |subdomain| f(subdomain).boxed()),
        }
    }
}

impl std::fmt::Debug for DynamicDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicDirectory").finish()
    }
}

#[async_trait]
impl TenantDirectory for DynamicDirectory {
    async fn find_by_subdomain(&self, subdomain: &str) -> QueryResult<Option<Tenant>> {
        (self.lookup)(subdomain.to_ascii_lowercase()).await
    }
}

/// A directory that reads the tenant table through a [`QueryEngine`].
///
/// [`Tenant`] is a global model, so the lookup is unaffected by whatever
/// tenant context the caller happens to be in.
#[derive(Debug, Clone)]
pub struct EngineDirectory<E: QueryEngine> {
    engine: E,
}

impl<E: QueryEngine> EngineDirectory<E> {
    /// Create a directory over `engine`.
    pub fn new(engine: E) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl<E: QueryEngine> TenantDirectory for EngineDirectory<E> {
    async fn find_by_subdomain(&self, subdomain: &str) -> QueryResult<Option<Tenant>> {
        self.engine
            .repository::<Tenant>()
            .find_first()
            .r#where(Filter::equals("subdomain", subdomain.to_ascii_lowercase()))
            .exec()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryError;
    use crate::memory::MemoryEngine;
    use crate::tenant::context::with_tenant;

    #[tokio::test]
    async fn test_static_directory() {
        let directory = StaticDirectory::from_tenants([
            Tenant::new(1_i64, "algarrobos"),
            Tenant::new(2_i64, "Puntablanca"),
        ]);

        assert_eq!(directory.len(), 2);
        assert!(directory.contains("PUNTABLANCA"));

        let found = directory.find_by_subdomain("Algarrobos").await.unwrap();
        assert_eq!(found.unwrap().id.as_str(), "1");
        assert!(directory.find_by_subdomain("demo").await.unwrap().is_none());

        directory.unregister("algarrobos");
        assert!(directory.find_by_subdomain("algarrobos").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_dynamic_directory_propagates_errors() {
        let directory = DynamicDirectory::new(|subdomain| async move {
            match subdomain.as_str() {
                "t1" => Ok(Some(Tenant::new(1_i64, "t1"))),
                "down" => Err(QueryError::connection("directory unavailable")),
                _ => Ok(None),
            }
        });

        assert!(directory.find_by_subdomain("T1").await.unwrap().is_some());
        assert!(directory.find_by_subdomain("t2").await.unwrap().is_none());
        assert!(directory.find_by_subdomain("down").await.unwrap_err().is_connection_error());
    }

    #[tokio::test]
    async fn test_engine_directory_ignores_active_tenant() {
        let engine = MemoryEngine::new();
        let tenants = engine.repository::<Tenant>();
        tenants.create(Tenant::new(1_i64, "t1")).exec().await.unwrap();
        tenants.create(Tenant::new(2_i64, "t2")).exec().await.unwrap();

        let directory = EngineDirectory::new(engine);
        let found = with_tenant(Tenant::new(1_i64, "t1"), async {
            directory.find_by_subdomain("t2").await
        })
        .await
        .unwrap();

        assert_eq!(found.map(|t| t.subdomain), Some("t2".to_string()));
    }
}

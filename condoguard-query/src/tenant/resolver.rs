//! Resolution of the active tenant from request metadata.
//!
//! The tenant is named by the left-most label of the request host
//! (`algarrobos.condo.app` names `algarrobos`). Shared hosts such as
//! `localhost` name no tenant; outside production they may carry an explicit
//! override instead. The only failure is tenant-not-found, and it never says
//! which subdomain was attempted.

use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

use tracing::debug;

use super::cache::CachedDirectory;
use super::directory::TenantDirectory;
use super::host::{normalize_host, subdomain_of};
use super::model::{Tenant, TenantEnvironment, TenantState};
use crate::config::TenancyConfig;
use crate::error::{QueryError, QueryResult};

/// The request metadata the resolver looks at.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestInfo<'a> {
    /// Raw host, as received (may include a port).
    pub host: &'a str,
    /// Explicit tenant override, if the request carries one.
    pub override_id: Option<&'a str>,
    /// Whether the route works without a tenant.
    pub tenant_optional: bool,
    /// Peer address, for origin policies.
    pub remote_addr: Option<IpAddr>,
}

impl<'a> RequestInfo<'a> {
    /// Describe a request to `host` on a route that requires a tenant.
    pub fn new(host: &'a str) -> Self {
        Self {
            host,
            ..Default::default()
        }
    }

    /// Attach an override identifier.
    pub fn with_override(mut self, override_id: Option<&'a str>) -> Self {
        self.override_id = override_id;
        self
    }

    /// Mark the route as tenant-optional.
    pub fn tenant_optional(mut self, optional: bool) -> Self {
        self.tenant_optional = optional;
        self
    }

    /// Attach the peer address.
    pub fn with_remote_addr(mut self, addr: Option<IpAddr>) -> Self {
        self.remote_addr = addr;
        self
    }
}

/// Decides whether a tenant in the `internal` environment may be served to
/// a request. A denial is indistinguishable from an unknown subdomain.
pub trait OriginPolicy: Send + Sync {
    /// Whether `request` may act on behalf of `tenant`.
    fn permits(&self, tenant: &Tenant, request: &RequestInfo<'_>) -> bool;
}

impl<F> OriginPolicy for F
where
    F: Fn(&Tenant, &RequestInfo<'_>) -> bool + Send + Sync,
{
    fn permits(&self, tenant: &Tenant, request: &RequestInfo<'_>) -> bool {
        self(tenant, request)
    }
}

/// Resolves requests to a [`TenantState`] through a [`TenantDirectory`].
pub struct TenantResolver<D> {
    directory: Arc<D>,
    config: Arc<TenancyConfig>,
    origin_policy: Option<Arc<dyn OriginPolicy>>,
}

impl<D> Clone for TenantResolver<D> {
    fn clone(&self) -> Self {
        Self {
            directory: Arc::clone(&self.directory),
            config: Arc::clone(&self.config),
            origin_policy: self.origin_policy.clone(),
        }
    }
}

impl<D> fmt::Debug for TenantResolver<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TenantResolver")
            .field("config", &self.config)
            .field("origin_policy", &self.origin_policy.is_some())
            .finish_non_exhaustive()
    }
}

impl<D: TenantDirectory> TenantResolver<CachedDirectory<D>> {
    /// Create a resolver over `directory`, cached with the settings in
    /// `config`.
    pub fn cached(directory: D, config: TenancyConfig) -> Self {
        let directory = CachedDirectory::from_config(directory, &config);
        Self::new(directory, config)
    }
}

impl<D: TenantDirectory> TenantResolver<D> {
    /// Create a resolver over `directory`.
    pub fn new(directory: D, config: TenancyConfig) -> Self {
        Self {
            directory: Arc::new(directory),
            config: Arc::new(config),
            origin_policy: None,
        }
    }

    /// Consult `policy` before serving tenants in the `internal` environment.
    pub fn with_origin_policy<P: OriginPolicy + 'static>(mut self, policy: P) -> Self {
        self.origin_policy = Some(Arc::new(policy));
        self
    }

    /// The configuration in use.
    pub fn config(&self) -> &TenancyConfig {
        &self.config
    }

    /// The underlying directory.
    pub fn directory(&self) -> &D {
        &self.directory
    }

    /// The subdomain the request names, if any. No lookup is done.
    pub fn candidate(&self, request: &RequestInfo<'_>) -> Option<String> {
        let host = normalize_host(request.host)?;

        if self.config.is_root_host(&host) {
            if !self.config.allows_override() {
                return None;
            }
            return request
                .override_id
                .map(|id| id.trim().to_ascii_lowercase())
                .filter(|id| !id.is_empty());
        }

        subdomain_of(&host).map(str::to_string)
    }

    /// Resolve the request to a tenant state.
    ///
    /// Fails with tenant-not-found only when the route requires a tenant and
    /// none could be established. Directory errors propagate unchanged.
    pub async fn resolve(&self, request: &RequestInfo<'_>) -> QueryResult<TenantState> {
        let Some(candidate) = self.candidate(request) else {
            debug!(optional = request.tenant_optional, "No tenant candidate for request");
            return self.unresolved(request);
        };

        let Some(tenant) = self.directory.find_by_subdomain(&candidate).await? else {
            debug!(subdomain = %candidate, optional = request.tenant_optional, "Unknown tenant subdomain");
            return self.unresolved(request);
        };

        if !self.origin_permits(&tenant, request) {
            debug!(subdomain = %candidate, "Origin policy denied tenant");
            return self.unresolved(request);
        }

        debug!(tenant_id = %tenant.id, environment = %tenant.environment, "Resolved tenant");
        Ok(TenantState::from(tenant))
    }

    fn origin_permits(&self, tenant: &Tenant, request: &RequestInfo<'_>) -> bool {
        match (&self.origin_policy, tenant.environment) {
            (Some(policy), TenantEnvironment::Internal) => policy.permits(tenant, request),
            _ => true,
        }
    }

    fn unresolved(&self, request: &RequestInfo<'_>) -> QueryResult<TenantState> {
        if request.tenant_optional {
            Ok(TenantState::Unset)
        } else {
            Err(QueryError::tenant_not_found())
        }
    }
}

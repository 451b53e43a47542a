//! Tenant records and the per-request tenant state.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::filter::FilterValue;
use crate::traits::{Global, Model};

/// A unique identifier for a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    /// Create a new tenant ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the tenant ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TenantId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TenantId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<i64> for TenantId {
    fn from(i: i64) -> Self {
        Self::new(i.to_string())
    }
}

impl From<i32> for TenantId {
    fn from(i: i32) -> Self {
        Self::new(i.to_string())
    }
}

/// Lifecycle status of a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TenantStatus {
    /// Live tenant.
    #[default]
    Active,
    /// Suspended or retired tenant.
    Inactive,
    /// Demonstration tenant.
    Demo,
}

/// Environment class a tenant runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenantEnvironment {
    /// Real customers.
    #[default]
    Production,
    /// Demonstration data.
    Demo,
    /// Staff-only tenant; resolution may be restricted by origin.
    Internal,
}

impl TenantEnvironment {
    /// The lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Demo => "demo",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for TenantEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One condominium.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    /// Unique identifier.
    pub id: TenantId,
    /// Unique public subdomain, lowercase.
    pub subdomain: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Lifecycle status.
    #[serde(default)]
    pub status: TenantStatus,
    /// Environment class.
    #[serde(default)]
    pub environment: TenantEnvironment,
}

impl Tenant {
    /// Create an active production tenant.
    pub fn new(id: impl Into<TenantId>, subdomain: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            subdomain: subdomain.into().to_ascii_lowercase(),
            name: String::new(),
            status: TenantStatus::Active,
            environment: TenantEnvironment::Production,
        }
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the status.
    pub fn with_status(mut self, status: TenantStatus) -> Self {
        self.status = status;
        self
    }

    /// Set the environment class.
    pub fn with_environment(mut self, environment: TenantEnvironment) -> Self {
        self.environment = environment;
        self
    }
}

// Tenants are not owned by a tenant.
impl Model for Tenant {
    const MODEL_NAME: &'static str = "Tenant";
    const TABLE_NAME: &'static str = "condominiums";
    type Scope = Global;

    fn id(&self) -> FilterValue {
        FilterValue::from(&self.id)
    }
}

/// The tenant state of one request or task: `Unset` or `Active(tenant)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TenantState {
    /// No tenant; reads are unconstrained.
    #[default]
    Unset,
    /// Acting on behalf of this tenant.
    Active(Arc<Tenant>),
}

impl TenantState {
    /// Activate `tenant`.
    pub fn active(tenant: impl Into<Arc<Tenant>>) -> Self {
        Self::Active(tenant.into())
    }

    /// The active tenant, if any.
    pub fn tenant(&self) -> Option<&Arc<Tenant>> {
        match self {
            Self::Active(tenant) => Some(tenant),
            Self::Unset => None,
        }
    }

    /// The active tenant's id, if any.
    pub fn tenant_id(&self) -> Option<&TenantId> {
        self.tenant().map(|t| &t.id)
    }

    /// Whether a tenant is active.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active(_))
    }

    /// The request environment: the tenant's class, or production when unset.
    pub fn environment(&self) -> TenantEnvironment {
        self.tenant()
            .map(|t| t.environment)
            .unwrap_or(TenantEnvironment::Production)
    }
}

impl From<Tenant> for TenantState {
    fn from(tenant: Tenant) -> Self {
        Self::Active(Arc::new(tenant))
    }
}

impl From<Option<Tenant>> for TenantState {
    fn from(tenant: Option<Tenant>) -> Self {
        tenant.map_or(Self::Unset, Self::from)
    }
}

//! Tenant stamping for new records.
//!
//! A scoped record created without an owner inherits the active tenant. An
//! owner set by the caller is left alone, and nothing is ever rejected here.

use tracing::debug;

use super::context;
use super::model::{TenantId, TenantState};
use crate::traits::{Model, Scope};

/// What happened to a record's tenant reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stamp {
    /// The active tenant was assigned.
    Injected(TenantId),
    /// The record already had an owner.
    Explicit,
    /// No tenant was active; the reference stays unset.
    NoContext,
    /// The model is not tenant-scoped.
    Global,
}

impl Stamp {
    /// Whether the record was modified.
    pub fn is_injected(&self) -> bool {
        matches!(self, Self::Injected(_))
    }
}

/// Assign the tenant from `state` to `record` when it has none.
pub fn stamp<M: Model>(record: &mut M, state: &TenantState) -> Stamp {
    if <M::Scope as Scope<M>>::COLUMN.is_none() {
        return Stamp::Global;
    }
    if <M::Scope as Scope<M>>::tenant_of(record).is_some() {
        return Stamp::Explicit;
    }
    let Some(tenant_id) = state.tenant_id() else {
        return Stamp::NoContext;
    };

    <M::Scope as Scope<M>>::assign(record, tenant_id.clone());
    debug!(model = M::MODEL_NAME, tenant_id = %tenant_id, "Injected tenant into new record");
    Stamp::Injected(tenant_id.clone())
}

/// [`stamp`] with the current context.
pub fn stamp_current<M: Model>(record: &mut M) -> Stamp {
    stamp(record, &context::current())
}

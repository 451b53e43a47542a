//! Request-scoped tenant context.
//!
//! The active tenant lives in Tokio task-local storage, so every in-flight
//! request carries its own value and no request can observe another's.
//! Entering a scope is the "activate", leaving it is the "clear": the value
//! cannot outlive the future it was attached to.
//!
//! ```rust,ignore
//! use condoguard_query::tenant::{current_tenant, with_tenant};
//!
//! with_tenant(tenant, async {
//!     // Every repository call in here is confined to `tenant`.
//!     let units = client.repository::<Unit>().find_many().exec().await?;
//!     assert!(current_tenant().is_some());
//!     Ok(())
//! }).await?;
//! ```
//!
//! Tasks started with `tokio::spawn` do not inherit task-locals. Wrap the
//! spawned future with [`in_current_scope`] to carry the state across.
//!
//! Synchronous code that runs outside any Tokio runtime (scripts, CLI
//! commands, plain threads) can use [`activate_sync`], which sets a
//! thread-local slot until the returned guard is dropped. The slot is never
//! consulted while a runtime is running on the thread: one worker thread
//! polls many tasks, so a per-thread value would leak between them.

use std::cell::RefCell;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use tokio::runtime::Handle;

use super::model::{Tenant, TenantEnvironment, TenantId, TenantState};
use crate::error::{QueryError, QueryResult};

tokio::task_local! {
    /// Task-local tenant state.
    static TENANT_STATE: TenantState;
}

thread_local! {
    /// Thread-local tenant state for sync code paths.
    static SYNC_TENANT_STATE: RefCell<TenantState> = const { RefCell::new(TenantState::Unset) };
}

/// Run `f` with the given tenant state.
pub async fn with_state<F>(state: TenantState, f: F) -> F::Output
where
    F: Future,
{
    TENANT_STATE.scope(state, f).await
}

/// Run `f` acting on behalf of `tenant`.
pub async fn with_tenant<F>(tenant: impl Into<Arc<Tenant>>, f: F) -> F::Output
where
    F: Future,
{
    with_state(TenantState::Active(tenant.into()), f).await
}

/// Run `f` with no tenant, shadowing any outer scope.
pub async fn without_tenant<F>(f: F) -> F::Output
where
    F: Future,
{
    with_state(TenantState::Unset, f).await
}

/// Capture the current state and attach it to `f`.
///
/// Use this for futures handed to `tokio::spawn`, which would otherwise
/// start in the `Unset` state.
pub fn in_current_scope<F>(f: F) -> impl Future<Output = F::Output>
where
    F: Future,
{
    let state = current();
    TENANT_STATE.scope(state, f)
}

/// The current tenant state.
///
/// Inside a task scope this is the scope's state. Outside one it is `Unset`
/// on runtime threads, and the [`activate_sync`] slot everywhere else.
#[inline]
pub fn current() -> TenantState {
    TENANT_STATE.try_with(TenantState::clone).unwrap_or_else(|_| {
        if Handle::try_current().is_ok() {
            TenantState::Unset
        } else {
            SYNC_TENANT_STATE.with(|cell| cell.borrow().clone())
        }
    })
}

/// The active tenant, if any.
#[inline]
pub fn current_tenant() -> Option<Arc<Tenant>> {
    match current() {
        TenantState::Active(tenant) => Some(tenant),
        TenantState::Unset => None,
    }
}

/// The active tenant's id, if any.
#[inline]
pub fn current_tenant_id() -> Option<TenantId> {
    current().tenant_id().cloned()
}

/// The environment class of the current request. Production when unset.
#[inline]
pub fn current_environment() -> TenantEnvironment {
    current().environment()
}

/// Check if a tenant is currently active.
#[inline]
pub fn has_tenant() -> bool {
    current().is_active()
}

/// The active tenant, or a not-found error when there is none.
///
/// For handlers that only make sense inside a condominium.
pub fn require_tenant() -> QueryResult<Arc<Tenant>> {
    current_tenant().ok_or_else(QueryError::tenant_not_found)
}

// ============================================================================
// Sync Context (Thread-Local)
// ============================================================================

/// Activate `tenant` for synchronous code on the current thread.
///
/// The previous state is restored when the guard is dropped. Has no effect
/// on code running inside a Tokio runtime; use [`with_tenant`] there.
pub fn activate_sync(tenant: impl Into<Arc<Tenant>>) -> ContextGuard {
    replace_sync(TenantState::Active(tenant.into()))
}

/// Clear the sync tenant on the current thread until the guard is dropped.
pub fn clear_sync() -> ContextGuard {
    replace_sync(TenantState::Unset)
}

fn replace_sync(state: TenantState) -> ContextGuard {
    let previous = SYNC_TENANT_STATE.with(|cell| cell.replace(state));
    ContextGuard {
        previous: Some(previous),
        _not_send: PhantomData,
    }
}

/// Guard that restores the previous sync tenant when dropped.
#[must_use = "the tenant is cleared as soon as the guard is dropped"]
pub struct ContextGuard {
    previous: Option<TenantState>,
    _not_send: PhantomData<*const ()>,
}

impl std::fmt::Debug for ContextGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextGuard").finish_non_exhaustive()
    }
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        let previous = self.previous.take().unwrap_or_default();
        // The slot may already be gone during thread teardown.
        let _ = SYNC_TENANT_STATE.try_with(|cell| cell.replace(previous));
    }
}

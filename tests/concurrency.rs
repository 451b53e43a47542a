//! Integration tests for tenant context under concurrency.
//!
//! Concurrent requests acting for different tenants must never observe each
//! other's context, whether they share a worker thread or not.

mod common;

use std::sync::Arc;

use common::{User, emails, seeded, t1, t2};
use condoguard::prelude::*;
use condoguard::tenant::{activate_sync, current_tenant_id, in_current_scope};
use pretty_assertions::assert_eq;
use tokio::task::JoinSet;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_interleaved_requests_keep_their_tenant() {
    let engine = seeded().await;
    let mut requests = JoinSet::new();

    for i in 0..64 {
        let tenant = if i % 2 == 0 { t1() } else { t2() };
        let users = engine.repository::<User>();
        requests.spawn(with_tenant(tenant.clone(), async move {
            for _ in 0..4 {
                tokio::task::yield_now().await;
                assert_eq!(current_tenant_id(), Some(tenant.id.clone()));
            }
            let seen = users.find_many().exec().await.unwrap();
            (tenant.subdomain.clone(), emails(&seen).join(","))
        }));
    }

    while let Some(result) = requests.join_next().await {
        let (subdomain, seen) = result.unwrap();
        let expected = if subdomain == "t1" { "u1@t1.cl" } else { "u2@t2.cl" };
        assert_eq!(seen, expected);
    }
}

#[tokio::test]
async fn test_spawned_tasks_start_without_tenant() {
    let inherited = with_tenant(t1(), async {
        let plain = tokio::spawn(async { current_tenant() }).await.unwrap();
        let carried = tokio::spawn(in_current_scope(async { current_tenant() }))
            .await
            .unwrap();
        (plain, carried)
    })
    .await;

    assert_eq!(inherited.0, None);
    assert_eq!(inherited.1.map(|t| t.subdomain.clone()), Some("t1".to_string()));
}

#[tokio::test]
async fn test_nested_scopes_restore_outer_tenant() {
    let outcome = with_tenant(t1(), async {
        let inner = with_tenant(t2(), async { current_tenant_id() }).await;
        let cleared = without_tenant(async { current_tenant_id() }).await;
        (inner, cleared, current_tenant_id())
    })
    .await;

    assert_eq!(
        outcome,
        (
            Some(TenantId::from(2_i64)),
            None,
            Some(TenantId::from(1_i64))
        )
    );
    assert_eq!(current_tenant_id(), None);
}

#[test]
fn test_sync_context_per_thread() {
    let _guard = activate_sync(Arc::new(t1()));
    assert_eq!(current_tenant_id(), Some(TenantId::from(1_i64)));

    let other_thread = std::thread::spawn(current_tenant_id).join().unwrap();
    assert_eq!(other_thread, None);
}

#[tokio::test]
async fn test_sync_guard_does_not_reach_runtime_tasks() {
    let engine = seeded().await;
    let _guard = activate_sync(Arc::new(t1()));

    let users = engine.repository::<User>();
    let (current, seen, created) = tokio::spawn(async move {
        let seen = users.find_many().exec().await.unwrap();
        let created = users.create(User::new("walk-in@nowhere.cl")).exec().await.unwrap();
        (current_tenant(), seen, created)
    })
    .await
    .unwrap();

    assert_eq!(current, None);
    assert_eq!(emails(&seen), vec!["u1@t1.cl", "u2@t2.cl"]);
    assert_eq!(created.condominium_id, None);
}

//! Integration tests for tenant-scoped reads and writes.
//!
//! These tests exercise the repository from the outside:
//! - Set-returning reads under each tenant and under no tenant
//! - By-id reads of foreign rows
//! - Auto-tenant injection on create
//! - Pagination and counting under a tenant

mod common;

use common::{Plan, Unit, User, emails, seeded, t1, t2};
use condoguard::prelude::*;
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_two_tenant_scenario() {
    let engine = seeded().await;
    let users = engine.repository::<User>();

    let (all, other, own) = with_tenant(t1(), async {
        (
            users.find_many().exec().await.unwrap(),
            users.find_by_id(2_i64).exec().await.unwrap(),
            users.find_by_id(1_i64).exec().await.unwrap(),
        )
    })
    .await;
    assert_eq!(emails(&all), vec!["u1@t1.cl"]);
    assert_eq!(other, None);
    assert_eq!(own.map(|u| u.email), Some("u1@t1.cl".to_string()));

    let (all, other, own) = with_tenant(t2(), async {
        (
            users.find_many().exec().await.unwrap(),
            users.find_by_id(1_i64).exec().await.unwrap(),
            users.find_by_id(2_i64).exec().await.unwrap(),
        )
    })
    .await;
    assert_eq!(emails(&all), vec!["u2@t2.cl"]);
    assert_eq!(other, None);
    assert_eq!(own.map(|u| u.email), Some("u2@t2.cl".to_string()));

    let all = users.find_many().exec().await.unwrap();
    assert_eq!(emails(&all), vec!["u1@t1.cl", "u2@t2.cl"]);
}

#[tokio::test]
async fn test_user_filters_cannot_widen_the_tenant() {
    let engine = seeded().await;
    let users = engine.repository::<User>();

    let found = with_tenant(
        t1(),
        users
            .find_many()
            .r#where(Filter::or([
                Filter::equals("condominium_id", TenantId::from(2_i64)),
                Filter::equals("email", "u2@t2.cl"),
            ]))
            .exec(),
    )
    .await
    .unwrap();
    assert!(found.is_empty());

    let first = with_tenant(
        t1(),
        users.find_first().r#where(Filter::equals("email", "u2@t2.cl")).exec(),
    )
    .await
    .unwrap();
    assert_eq!(first, None);
}

#[tokio::test]
async fn test_find_one_reports_foreign_row_as_missing() {
    let engine = seeded().await;
    let users = engine.repository::<User>();

    let err = with_tenant(
        t1(),
        users.find_one().r#where(Filter::equals("email", "u2@t2.cl")).exec(),
    )
    .await
    .unwrap_err();
    assert!(err.is_not_found());

    let err = with_tenant(t1(), users.find_by_id(2_i64).exec_or_not_found())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_global_models_are_shared() {
    let engine = seeded().await;
    let plans = engine.repository::<Plan>();

    let seen_by_t1 = with_tenant(t1(), plans.find_many().exec()).await.unwrap();
    let seen_by_t2 = with_tenant(t2(), plans.count().exec()).await.unwrap();
    let by_id = with_tenant(t2(), plans.find_by_id(1_i64).exec()).await.unwrap();

    assert_eq!(seen_by_t1.len(), 2);
    assert_eq!(seen_by_t2, 2);
    assert_eq!(by_id.map(|p| p.name), Some("basic".to_string()));
}

#[tokio::test]
async fn test_create_injects_active_tenant() {
    let engine = MemoryEngine::new();
    let units = engine.repository::<Unit>();

    let unit = with_tenant(
        t2(),
        units
            .create(Unit {
                id: None,
                building_owner: None,
                number: "B-1204".into(),
                floor: 12,
            })
            .exec(),
    )
    .await
    .unwrap();
    assert_eq!(unit.building_owner, Some(TenantId::from(2_i64)));

    let seen_by_t1 = with_tenant(t1(), units.find_by_id(unit.id.unwrap()).exec())
        .await
        .unwrap();
    assert_eq!(seen_by_t1, None);
}

#[tokio::test]
async fn test_create_keeps_explicit_owner_and_allows_no_context() {
    let engine = MemoryEngine::new();
    let units = engine.repository::<Unit>();

    let explicit = with_tenant(
        t1(),
        units
            .create(Unit {
                id: None,
                building_owner: Some(TenantId::from(2_i64)),
                number: "A-101".into(),
                floor: 1,
            })
            .exec(),
    )
    .await
    .unwrap();
    assert_eq!(explicit.building_owner, Some(TenantId::from(2_i64)));

    let unowned = units
        .create(Unit {
            id: None,
            building_owner: None,
            number: "A-102".into(),
            floor: 1,
        })
        .exec()
        .await
        .unwrap();
    assert_eq!(unowned.building_owner, None);

    // A row without an owner is not visible to any tenant.
    let seen = with_tenant(t1(), units.find_by_id(unowned.id.unwrap()).exec())
        .await
        .unwrap();
    assert_eq!(seen, None);
}

#[tokio::test]
async fn test_paginate_and_count_are_scoped() {
    let engine = MemoryEngine::new();
    for floor in 1..=25 {
        let owner = if floor % 5 == 0 { t2() } else { t1() };
        engine
            .insert(Unit {
                id: None,
                building_owner: Some(owner.id.clone()),
                number: format!("U-{floor}"),
                floor,
            })
            .await
            .unwrap();
    }
    let units = engine.repository::<Unit>();

    let page = with_tenant(
        t1(),
        units
            .paginate(2, 8)
            .order_by(OrderByField::asc("floor"))
            .exec(),
    )
    .await
    .unwrap();
    assert_eq!(page.total, 20);
    assert_eq!(page.pages(), 3);
    assert_eq!(page.items.len(), 8);
    assert_eq!(page.items[0].number, "U-11");
    assert!(page.items.iter().all(|u| u.floor % 5 != 0));

    let high_floors = with_tenant(
        t2(),
        units.count().r#where(Filter::Gt("floor".into(), FilterValue::Int(12))).exec(),
    )
    .await
    .unwrap();
    assert_eq!(high_floors, 3);

    let oversized = units.paginate(0, 1_000).exec().await.unwrap();
    assert_eq!(oversized.page, 1);
    assert_eq!(oversized.per_page, 100);
    assert_eq!(oversized.total, 25);
}

#[tokio::test]
async fn test_store_failure_propagates() {
    let engine = seeded().await;
    engine.set_offline(true);

    let err = with_tenant(t1(), engine.repository::<User>().find_many().exec())
        .await
        .unwrap_err();
    assert!(!err.is_not_found());
}

//! Models and seed data shared by the integration tests.

#![allow(dead_code)]

use condoguard::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Option<i64>,
    pub condominium_id: Option<TenantId>,
    pub email: String,
}

impl User {
    pub fn new(email: &str) -> Self {
        Self {
            id: None,
            condominium_id: None,
            email: email.to_string(),
        }
    }

    pub fn owned_by(mut self, tenant: &Tenant) -> Self {
        self.condominium_id = Some(tenant.id.clone());
        self
    }
}

impl Model for User {
    const MODEL_NAME: &'static str = "User";
    const TABLE_NAME: &'static str = "users";
    type Scope = Scoped;

    fn id(&self) -> FilterValue {
        self.id.into()
    }
}

impl TenantScoped for User {
    fn tenant_id(&self) -> Option<&TenantId> {
        self.condominium_id.as_ref()
    }

    fn set_tenant_id(&mut self, tenant: TenantId) {
        self.condominium_id = Some(tenant);
    }
}

/// A unit, owned through a differently named column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: Option<i64>,
    pub building_owner: Option<TenantId>,
    pub number: String,
    pub floor: i64,
}

impl Model for Unit {
    const MODEL_NAME: &'static str = "Unit";
    const TABLE_NAME: &'static str = "units";
    type Scope = Scoped;

    fn id(&self) -> FilterValue {
        self.id.into()
    }
}

impl TenantScoped for Unit {
    const TENANT_COLUMN: &'static str = "building_owner";

    fn tenant_id(&self) -> Option<&TenantId> {
        self.building_owner.as_ref()
    }

    fn set_tenant_id(&mut self, tenant: TenantId) {
        self.building_owner = Some(tenant);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: Option<i64>,
    pub name: String,
}

impl Model for Plan {
    const MODEL_NAME: &'static str = "Plan";
    const TABLE_NAME: &'static str = "plans";
    type Scope = Global;

    fn id(&self) -> FilterValue {
        self.id.into()
    }
}

pub fn t1() -> Tenant {
    Tenant::new(1_i64, "t1").with_name("Los Algarrobos")
}

pub fn t2() -> Tenant {
    Tenant::new(2_i64, "t2").with_name("Punta Blanca")
}

/// `u1` (id 1) belongs to t1, `u2` (id 2) to t2. Two plans.
pub async fn seeded() -> MemoryEngine {
    let engine = MemoryEngine::new();
    engine.insert(User::new("u1@t1.cl").owned_by(&t1())).await.unwrap();
    engine.insert(User::new("u2@t2.cl").owned_by(&t2())).await.unwrap();
    for name in ["basic", "premium"] {
        engine
            .insert(Plan {
                id: None,
                name: name.to_string(),
            })
            .await
            .unwrap();
    }
    engine
}

pub fn emails(users: &[User]) -> Vec<&str> {
    users.iter().map(|u| u.email.as_str()).collect()
}

//! Models and seed data shared by the operation tests.

use serde::{Deserialize, Serialize};

use crate::filter::FilterValue;
use crate::memory::MemoryEngine;
use crate::tenant::model::{Tenant, TenantId};
use crate::traits::{Global, Model, QueryEngine, Scoped, TenantScoped};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct User {
    pub id: Option<i64>,
    pub condominium_id: Option<TenantId>,
    pub email: String,
    pub role: String,
}

impl User {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: None,
            condominium_id: None,
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn owned_by(mut self, tenant: i64) -> Self {
        self.condominium_id = Some(TenantId::from(tenant));
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

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Module {
    pub id: Option<i64>,
    pub code: String,
}

impl Model for Module {
    const MODEL_NAME: &'static str = "Module";
    const TABLE_NAME: &'static str = "modules";
    type Scope = Global;

    fn id(&self) -> FilterValue {
        self.id.into()
    }
}

pub(crate) fn t1() -> Tenant {
    Tenant::new(1_i64, "t1")
}

pub(crate) fn t2() -> Tenant {
    Tenant::new(2_i64, "t2")
}

/// Users 1..=4: two in t1, one in t2, one with no tenant. Two modules.
pub(crate) async fn seeded() -> MemoryEngine {
    let engine = MemoryEngine::new();
    for user in [
        User::new("admin@t1.cl", "ADMIN").owned_by(1),
        User::new("admin@t2.cl", "ADMIN").owned_by(2),
        User::new("owner@t1.cl", "OWNER").owned_by(1),
        User::new("orphan@nowhere.cl", "OWNER"),
    ] {
        engine.insert(user).await.unwrap();
    }
    for code in ["finance", "bookings"] {
        engine
            .insert(Module {
                id: None,
                code: code.to_string(),
            })
            .await
            .unwrap();
    }
    engine
}

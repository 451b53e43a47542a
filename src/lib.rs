//! # Condoguard
//!
//! Multi-tenant data isolation for condominium management services.
//!
//! One deployment serves many condominiums from one shared store. Condoguard
//! keeps each request confined to the condominium it was addressed to:
//!
//! - The tenant is resolved from the request host (`algarrobos.condo.app`),
//!   or from an override parameter on shared hosts outside production
//! - The resolved tenant is held in a task-local context for the duration of
//!   the request
//! - Repository reads of tenant-scoped models are filtered to that tenant;
//!   by-id reads of another tenant's rows return nothing
//! - Records created without an owner are stamped with the active tenant
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use axum::{Router, routing::get};
//! use condoguard::prelude::*;
//!
//! async fn units(RequiredTenant(tenant): RequiredTenant) -> String {
//!     let units = engine().repository::<Unit>().find_many().exec().await?;
//!     format!("{} has {} units", tenant.name, units.len())
//! }
//!
//! let resolver = TenantResolver::new(directory, TenancyConfig::load("condoguard.toml")?);
//! let app = Router::new()
//!     .route("/units", get(units))
//!     .layer(TenantLayer::new(resolver));
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub use condoguard_query::*;

/// Axum integration.
#[cfg(feature = "web")]
#[cfg_attr(docsrs, doc(cfg(feature = "web")))]
pub mod axum {
    pub use condoguard_axum::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use condoguard_query::prelude::*;

    #[cfg(feature = "web")]
    pub use condoguard_axum::{
        CurrentTenant, RequiredTenant, RouteClassifier, TenancyRejection, TenantLayer,
    };
}

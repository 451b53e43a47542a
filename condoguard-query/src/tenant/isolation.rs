//! Tenant constraints for reads.
//!
//! Two rules keep one condominium's rows away from another:
//!
//! - Set-returning reads get `tenant_column = <active id>` ANDed onto their
//!   filter before the engine sees them ([`constrain`]).
//! - Primary-key reads load the record without conditions, then drop it when
//!   its owner differs from the active tenant ([`admit`]). A dropped record is
//!   the same `None` as a missing one.
//!
//! Both are no-ops for global models and when no tenant is active.

use tracing::{trace, warn};

use super::model::TenantState;
use crate::filter::Filter;
use crate::traits::{Model, Scope};

/// The equality constraint `M` needs under `state`, if any.
pub fn tenant_filter<M: Model>(state: &TenantState) -> Option<Filter> {
    let column = <M::Scope as Scope<M>>::COLUMN?;
    let tenant_id = state.tenant_id()?;
    Some(Filter::equals(column, tenant_id))
}

/// AND the tenant constraint onto `filter`.
///
/// A row whose tenant reference is null never equals the active id, so such
/// rows are excluded as well.
pub fn constrain<M: Model>(state: &TenantState, filter: Filter) -> Filter {
    match tenant_filter::<M>(state) {
        Some(constraint) => {
            trace!(model = M::MODEL_NAME, "Applying tenant constraint");
            constraint.and_then(filter)
        }
        None => filter,
    }
}

/// Keep `record` only if the active tenant may see it.
pub fn admit<M: Model>(state: &TenantState, record: Option<M>) -> Option<M> {
    let record = record?;
    if !is_visible(state, &record) {
        return None;
    }
    Some(record)
}

/// Whether `record` is visible under `state`.
pub fn is_visible<M: Model>(state: &TenantState, record: &M) -> bool {
    let (Some(_), Some(active)) = (<M::Scope as Scope<M>>::COLUMN, state.tenant_id()) else {
        return true;
    };

    match <M::Scope as Scope<M>>::tenant_of(record) {
        Some(owner) => owner == active,
        None => {
            warn!(
                model = M::MODEL_NAME,
                "Scoped record without a tenant reference hidden from active tenant"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterValue;
    use crate::tenant::model::{Tenant, TenantId};
    use crate::traits::{Global, Scoped, TenantScoped};
    use pretty_assertions::assert_eq;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Unit {
        id: i64,
        condominium_id: Option<TenantId>,
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
        fn tenant_id(&self) -> Option<&TenantId> {
            self.condominium_id.as_ref()
        }

        fn set_tenant_id(&mut self, tenant: TenantId) {
            self.condominium_id = Some(tenant);
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Module {
        id: i64,
    }

    impl Model for Module {
        const MODEL_NAME: &'static str = "Module";
        const TABLE_NAME: &'static str = "modules";
        type Scope = Global;

        fn id(&self) -> FilterValue {
            self.id.into()
        }
    }

    fn active(id: i64) -> TenantState {
        TenantState::from(Tenant::new(id, format!("t{}", id)))
    }

    fn unit(id: i64, owner: Option<i64>) -> Unit {
        Unit {
            id,
            condominium_id: owner.map(TenantId::from),
        }
    }

    #[test]
    fn test_constrain_scoped_model() {
        let filter = constrain::<Unit>(&active(1), Filter::equals("tower", "B"));
        assert_eq!(
            filter,
            Filter::And(vec![
                Filter::equals("condominium_id", "1"),
                Filter::equals("tower", "B"),
            ])
        );
    }

    #[test]
    fn test_constrain_is_noop_when_unset_or_global() {
        let filter = Filter::equals("tower", "B");
        assert_eq!(constrain::<Unit>(&TenantState::Unset, filter.clone()), filter);
        assert_eq!(constrain::<Module>(&active(1), Filter::none()), Filter::None);
    }

    #[test]
    fn test_admit_compares_owner() {
        assert_eq!(admit(&active(1), Some(unit(5, Some(1)))), Some(unit(5, Some(1))));
        assert_eq!(admit(&active(2), Some(unit(5, Some(1)))), None);
        assert_eq!(admit(&active(1), None::<Unit>), None);
    }

    #[test]
    fn test_admit_hides_null_owner_under_active_tenant() {
        assert_eq!(admit(&active(1), Some(unit(5, None))), None);
        assert_eq!(admit(&TenantState::Unset, Some(unit(5, None))), Some(unit(5, None)));
    }

    #[test]
    fn test_global_records_always_visible() {
        assert!(is_visible(&active(3), &Module { id: 1 }));
    }
}

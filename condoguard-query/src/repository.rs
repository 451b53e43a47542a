//! Typed entry point to the operations of one model.

use std::fmt;
use std::marker::PhantomData;

use crate::config::TenancyConfig;
use crate::filter::FilterValue;
use crate::operations::{
    CountOperation, CreateOperation, DEFAULT_MAX_PER_PAGE, FindByIdOperation, FindFirstOperation,
    FindManyOperation, FindOneOperation, FindUniqueOperation, PaginateOperation,
};
use crate::traits::{Model, QueryEngine};

/// Operations on `M` through engine `E`.
///
/// This is the sanctioned way to reach tenant-scoped data: every operation
/// it hands out applies the active tenant's constraint.
///
/// ```rust,ignore
/// let units = engine.repository::<Unit>();
/// let tower_b = units.find_many().r#where(Filter::equals("tower", "B")).exec().await?;
/// let unit = units.find_by_id(42).exec().await?;
/// ```
pub struct Repository<M: Model, E: QueryEngine> {
    engine: E,
    max_per_page: u64,
    _model: PhantomData<M>,
}

impl<M: Model, E: QueryEngine> Clone for Repository<M, E> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            max_per_page: self.max_per_page,
            _model: PhantomData,
        }
    }
}

impl<M: Model, E: QueryEngine> fmt::Debug for Repository<M, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("model", &M::MODEL_NAME)
            .field("max_per_page", &self.max_per_page)
            .finish()
    }
}

impl<M: Model, E: QueryEngine> Repository<M, E> {
    /// Create a repository over `engine`.
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            max_per_page: DEFAULT_MAX_PER_PAGE,
            _model: PhantomData,
        }
    }

    /// Create a repository over `engine` with the limits in `config`.
    pub fn from_config(engine: E, config: &TenancyConfig) -> Self {
        Self::new(engine).with_max_per_page(config.max_per_page)
    }

    /// Set the page size upper bound for [`paginate`](Self::paginate).
    pub fn with_max_per_page(mut self, max: u64) -> Self {
        self.max_per_page = max.max(1);
        self
    }

    /// The engine behind this repository.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Find every matching record.
    pub fn find_many(&self) -> FindManyOperation<E, M> {
        FindManyOperation::new(self.engine.clone())
    }

    /// Find the first matching record.
    pub fn find_first(&self) -> FindFirstOperation<E, M> {
        FindFirstOperation::new(self.engine.clone())
    }

    /// Find exactly one matching record.
    pub fn find_one(&self) -> FindOneOperation<E, M> {
        FindOneOperation::new(self.engine.clone())
    }

    /// Find at most one matching record.
    pub fn find_unique(&self) -> FindUniqueOperation<E, M> {
        FindUniqueOperation::new(self.engine.clone())
    }

    /// Load a record by primary key.
    pub fn find_by_id(&self, id: impl Into<FilterValue>) -> FindByIdOperation<E, M> {
        FindByIdOperation::new(self.engine.clone(), id)
    }

    /// Count matching records.
    pub fn count(&self) -> CountOperation<E, M> {
        CountOperation::new(self.engine.clone())
    }

    /// Read one page (1-indexed) of matching records.
    pub fn paginate(&self, page: u64, per_page: u64) -> PaginateOperation<E, M> {
        PaginateOperation::new(self.engine.clone())
            .max_per_page(self.max_per_page)
            .page(page)
            .per_page(per_page)
    }

    /// Insert a record.
    pub fn create(&self, record: M) -> CreateOperation<E, M> {
        CreateOperation::new(self.engine.clone(), record)
    }
}

//! Paginate operation: one page of records plus the total they come from.

use std::marker::PhantomData;

use tracing::debug;

use crate::error::QueryResult;
use crate::filter::{Filter, FilterValue};
use crate::pagination::{Page, Pagination};
use crate::query::SelectQuery;
use crate::tenant::context;
use crate::tenant::isolation::constrain;
use crate::tenant::model::TenantState;
use crate::traits::{Model, QueryEngine};
use crate::types::OrderBy;

/// Default page size.
pub const DEFAULT_PER_PAGE: u64 = 20;

/// Default upper bound for the page size.
pub const DEFAULT_MAX_PER_PAGE: u64 = 100;

/// A paginated read.
///
/// The tenant constraint is applied before paging, and the count and the
/// page are taken with the same filter, so `total` never includes rows the
/// caller cannot see.
///
/// ```rust,ignore
/// let page = engine
///     .repository::<Charge>()
///     .paginate(2, 25)
///     .order_by(OrderByField::desc("issued_at"))
///     .exec()
///     .await?;
/// println!("{} of {} pages", page.page, page.pages());
/// ```
pub struct PaginateOperation<E: QueryEngine, M: Model> {
    engine: E,
    filter: Filter,
    order_by: OrderBy,
    page: u64,
    per_page: u64,
    max_per_page: u64,
    _model: PhantomData<M>,
}

impl<E: QueryEngine, M: Model> PaginateOperation<E, M> {
    /// Create a new Paginate operation for the first page.
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            filter: Filter::None,
            order_by: OrderBy::none(),
            page: 1,
            per_page: DEFAULT_PER_PAGE,
            max_per_page: DEFAULT_MAX_PER_PAGE,
            _model: PhantomData,
        }
    }

    /// Add a filter condition.
    pub fn r#where(mut self, filter: impl Into<Filter>) -> Self {
        self.filter = self.filter.and_then(filter.into());
        self
    }

    /// Set the order by clause.
    pub fn order_by(mut self, order: impl Into<OrderBy>) -> Self {
        self.order_by = order.into();
        self
    }

    /// Set the 1-indexed page. Page 0 is page 1.
    pub fn page(mut self, page: u64) -> Self {
        self.page = page.max(1);
        self
    }

    /// Set the page size.
    pub fn per_page(mut self, per_page: u64) -> Self {
        self.per_page = per_page;
        self
    }

    /// Set the page size upper bound.
    pub fn max_per_page(mut self, max: u64) -> Self {
        self.max_per_page = max.max(1);
        self
    }

    /// The page size actually used: between 1 and the upper bound.
    pub fn effective_per_page(&self) -> u64 {
        self.per_page.clamp(1, self.max_per_page)
    }

    /// The select for the page's rows under `state`.
    pub fn query_for(&self, state: &TenantState) -> SelectQuery {
        SelectQuery::new(M::TABLE_NAME)
            .with_filter(constrain::<M>(state, self.filter.clone()))
            .with_order_by(self.order_by.clone())
            .with_pagination(Pagination::page(self.page, self.effective_per_page()))
    }

    /// Build the page's SQL and the matching count SQL for the current
    /// tenant context.
    pub fn build_sql(&self) -> ((String, Vec<FilterValue>), (String, Vec<FilterValue>)) {
        let query = self.query_for(&context::current());
        (query.to_sql(), query.to_count_sql())
    }

    /// Execute the count and the page query.
    pub async fn exec(self) -> QueryResult<Page<M>> {
        let query = self.query_for(&context::current());
        let per_page = self.effective_per_page();
        debug!(model = M::MODEL_NAME, page = self.page, per_page, "paginate");

        let total = self.engine.count::<M>(&query.filter).await?;
        let items = self.engine.query_many::<M>(&query).await?;

        Ok(Page {
            items,
            total,
            page: self.page,
            per_page,
        })
    }
}

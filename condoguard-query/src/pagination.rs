//! Pagination types for query results.
//!
//! Offset pagination (`skip`/`take`) is what reaches the engine. Page-based
//! requests are converted with [`Pagination::page`], and the result of a
//! paginate operation is a [`Page`].
//!
//! ```rust
//! use condoguard_query::Pagination;
//!
//! let page_3 = Pagination::page(3, 25);
//! assert_eq!(page_3.skip, Some(50));
//! assert_eq!(page_3.take, Some(25));
//! assert_eq!(page_3.to_sql(), "LIMIT 25 OFFSET 50");
//! ```

use std::fmt::Write;

/// Pagination configuration for queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pagination {
    /// Number of records to skip.
    pub skip: Option<u64>,
    /// Maximum number of records to take.
    pub take: Option<u64>,
}

impl Pagination {
    /// Create a new pagination with no limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of records to skip.
    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Set the maximum number of records to take.
    pub fn take(mut self, take: u64) -> Self {
        self.take = Some(take);
        self
    }

    /// Check if pagination is specified.
    pub fn is_empty(&self) -> bool {
        self.skip.is_none() && self.take.is_none()
    }

    /// Generate SQL LIMIT/OFFSET clause.
    pub fn to_sql(&self) -> String {
        let mut sql = String::with_capacity(48);

        if let Some(take) = self.take {
            let _ = write!(sql, "LIMIT {}", take);
        }

        if let Some(skip) = self.skip {
            if !sql.is_empty() {
                sql.push(' ');
            }
            let _ = write!(sql, "OFFSET {}", skip);
        }

        sql
    }

    /// Get pagination for the first N records.
    pub fn first(n: u64) -> Self {
        Self::new().take(n)
    }

    /// Get pagination for a page (1-indexed). Page 0 is treated as page 1.
    pub fn page(page: u64, page_size: u64) -> Self {
        let skip = page.max(1).saturating_sub(1).saturating_mul(page_size);
        Self::new().skip(skip).take(page_size)
    }
}

/// One page of results together with the total they were drawn from.
///
/// `total` is counted with the same filter that selected `items`, so the
/// two always agree.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// The records on this page.
    pub items: Vec<T>,
    /// Total number of matching records across all pages.
    pub total: u64,
    /// The 1-indexed page number.
    pub page: u64,
    /// Page size used for this request.
    pub per_page: u64,
}

impl<T> Page<T> {
    /// Total number of pages (0 when there are no records).
    pub fn pages(&self) -> u64 {
        if self.per_page == 0 {
            return 0;
        }
        self.total.div_ceil(self.per_page)
    }

    /// Whether a later page exists.
    pub fn has_next(&self) -> bool {
        self.page < self.pages()
    }

    /// Whether an earlier page exists.
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// Map the items, keeping the paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
        }
    }
}

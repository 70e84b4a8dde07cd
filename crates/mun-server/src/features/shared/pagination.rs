//! Shared pagination utilities
//!
//! List endpoints accept `page` and `pageSize` query parameters. Each
//! endpoint supplies its own default and maximum page size; values outside
//! the range are clamped rather than rejected.
//!
//! Query structs declare the `page` and `pageSize` fields themselves and
//! convert with [`PageParams::new`]. Embedding via `serde(flatten)` breaks
//! query-string deserialization of the numeric fields, so it is avoided.

use serde::Serialize;

/// Default page size for entity listings
pub const DEFAULT_PAGE_SIZE: i64 = 200;

/// Maximum page size for entity listings
pub const MAX_PAGE_SIZE: i64 = 500;

/// Common pagination request parameters
#[derive(Debug, Clone, Copy, Default)]
pub struct PageParams {
    /// Page number (1-indexed). Defaults to 1.
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl PageParams {
    pub fn new(page: Option<i64>, page_size: Option<i64>) -> Self {
        Self { page, page_size }
    }

    /// Page number, 1-indexed, never below 1
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Page size clamped to [1, max], falling back to `default`
    pub fn size(&self, default: i64, max: i64) -> i64 {
        self.page_size.unwrap_or(default).clamp(1, max)
    }

    /// SQL OFFSET for this page
    pub fn offset(&self, default: i64, max: i64) -> i64 {
        (self.page() - 1) * self.size(default, max)
    }
}

/// Wrapper for paginated list responses
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub pagination: crate::api::PaginationMeta,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, page: i64, per_page: i64, total: i64) -> Self {
        Self {
            items,
            pagination: crate::api::PaginationMeta::new(page, per_page, total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = PageParams::default();
        assert_eq!(params.page(), 1);
        assert_eq!(params.size(DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE), 200);
        assert_eq!(params.offset(DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE), 0);
    }

    #[test]
    fn test_clamping() {
        let params = PageParams::new(Some(-2), Some(9999));
        assert_eq!(params.page(), 1);
        assert_eq!(params.size(DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE), 500);

        let params = PageParams::new(Some(3), Some(0));
        assert_eq!(params.size(25, 100), 1);
    }

    #[test]
    fn test_offset() {
        let params = PageParams::new(Some(3), Some(500));
        assert_eq!(params.offset(DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE), 1000);
    }

    #[test]
    fn test_paginated_response_clones() {
        let page = Paginated::new(vec![1, 2, 3], 2, 3, 10);
        let copy = page.clone();
        assert_eq!(copy.items, vec![1, 2, 3]);
        assert_eq!(copy.pagination.page, 2);
        assert_eq!(copy.pagination.pages, 4);
    }
}

//! Common API utilities and shared types

use serde::Deserialize;

// ============================================================================
// Pagination Defaults
// ============================================================================

/// Default page number (1-indexed)
pub fn default_page() -> i64 {
    1
}

/// Default page size for public APIs
pub fn default_page_size() -> i64 {
    10
}

/// Default page size for admin APIs
pub fn default_per_page() -> i64 {
    20
}

/// Largest accepted page size
pub const MAX_PAGE_SIZE: i64 = 100;

// ============================================================================
// Pagination Query Types
// ============================================================================

/// Basic pagination query parameters
#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

impl PaginationQuery {
    /// Clamp page and page size into sane bounds.
    pub fn clamped(&self) -> (i64, i64) {
        let page = self.page.max(1);
        let page_size = self.page_size.clamp(1, MAX_PAGE_SIZE);
        (page, page_size)
    }
}

/// Admin pagination query parameters
#[derive(Debug, Deserialize)]
pub struct AdminPaginationQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_per_page")]
    pub per_page: i64,
}

impl AdminPaginationQuery {
    pub fn clamped(&self) -> (i64, i64) {
        let page = self.page.max(1);
        let per_page = self.per_page.clamp(1, MAX_PAGE_SIZE);
        (page, per_page)
    }
}

/// Number of pages needed for `total` items at `page_size` per page.
pub fn total_pages(total: i64, page_size: i64) -> i64 {
    if total == 0 {
        0
    } else {
        (total + page_size - 1) / page_size
    }
}

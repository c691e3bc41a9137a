// ABOUTME: Pagination query parameters and response envelope for listing endpoints
// ABOUTME: Page numbering is one-based, mirroring the legacy API contract
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use serde::{Deserialize, Serialize};

/// Default page size for listing endpoints
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Query parameters accepted by paginated listings
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageParams {
    /// One-based page number
    #[serde(default = "default_page")]
    pub page: u32,
    /// Items per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

const fn default_page() -> u32 {
    1
}

const fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

impl PageParams {
    /// Build parameters from optional query values, clamping degenerate input
    #[must_use]
    pub fn from_query(page: Option<u32>, page_size: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or_else(default_page),
            page_size: page_size.unwrap_or_else(default_page_size),
        }
        .normalized()
    }

    /// Clamp degenerate values (page or size of zero) to their minimums
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            page: self.page.max(1),
            page_size: self.page_size.max(1),
        }
    }

    /// Row offset for the SQL query
    #[must_use]
    pub const fn offset(&self) -> i64 {
        ((self.page - 1) as i64) * (self.page_size as i64)
    }

    /// Row limit for the SQL query
    #[must_use]
    pub const fn limit(&self) -> i64 {
        self.page_size as i64
    }
}

/// Paginated response envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct Paginated<T> {
    /// Total rows matching the query
    pub total_count: i64,
    /// Rows for the requested page
    pub items: Vec<T>,
    /// Total number of pages
    pub total_pages: i64,
    /// The requested page
    pub current_page: u32,
    /// The requested page size
    pub page_size: u32,
}

impl<T> Paginated<T> {
    /// Build an envelope from a counted page of rows
    #[must_use]
    pub fn new(items: Vec<T>, total_count: i64, params: PageParams) -> Self {
        let page_size = i64::from(params.page_size.max(1));
        Self {
            total_count,
            items,
            total_pages: (total_count + page_size - 1) / page_size,
            current_page: params.page,
            page_size: params.page_size,
        }
    }
}

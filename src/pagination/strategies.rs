//! Pagination strategy implementations
//!
//! The legacy API pages with `start`/`limit`; the v2 (JSON:API) endpoints
//! page with a page number.

use super::types::{PaginationState, Paginator, DEFAULT_PAGE_SIZE, LIMIT_PARAM, START_PARAM};
use crate::query::QueryParams;

// ============================================================================
// Offset Pagination
// ============================================================================

/// Offset-based pagination
///
/// Sends `start=<offset>&limit=<page size>` and advances the offset by the
/// number of items actually consumed from each page.
#[derive(Debug, Clone)]
pub struct OffsetPaginator {
    /// Query parameter name for offset
    pub offset_param: String,
    /// Query parameter name for limit
    pub limit_param: String,
    /// Number of records per page
    pub limit_value: usize,
}

impl Default for OffsetPaginator {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl OffsetPaginator {
    /// Create an offset paginator using the standard `start`/`limit` keys
    pub fn new(limit_value: usize) -> Self {
        Self {
            offset_param: START_PARAM.to_string(),
            limit_param: LIMIT_PARAM.to_string(),
            limit_value: limit_value.max(1),
        }
    }
}

impl Paginator for OffsetPaginator {
    fn page_params(&self, state: &PaginationState) -> QueryParams {
        QueryParams::new()
            .with(self.offset_param.as_str(), state.offset)
            .with(self.limit_param.as_str(), self.limit_value)
    }

    fn page_size(&self) -> Option<usize> {
        Some(self.limit_value)
    }

    fn advance(&self, consumed: usize, state: &mut PaginationState) {
        state.add_offset(consumed);
    }
}

// ============================================================================
// Page Number Pagination
// ============================================================================

/// Page number pagination
///
/// Uses `?page=N`, optionally with a page size parameter. Without a page
/// size the run only ends on an empty page.
#[derive(Debug, Clone)]
pub struct PageNumberPaginator {
    /// Query parameter name for page number
    pub page_param: String,
    /// First page number (usually 0 or 1)
    pub start_page: usize,
    /// Optional page size parameter name
    pub page_size_param: Option<String>,
    /// Page size value
    pub page_size: Option<usize>,
}

impl PageNumberPaginator {
    /// Create a new page number paginator
    pub fn new(page_param: impl Into<String>, start_page: usize) -> Self {
        Self {
            page_param: page_param.into(),
            start_page,
            page_size_param: None,
            page_size: None,
        }
    }

    /// Set page size parameter
    #[must_use]
    pub fn with_page_size(mut self, param: impl Into<String>, size: usize) -> Self {
        self.page_size_param = Some(param.into());
        self.page_size = Some(size.max(1));
        self
    }
}

impl Paginator for PageNumberPaginator {
    fn page_params(&self, state: &PaginationState) -> QueryParams {
        let mut params = QueryParams::new().with(
            self.page_param.as_str(),
            self.start_page + state.page,
        );
        if let (Some(param), Some(size)) = (&self.page_size_param, self.page_size) {
            params.set(param.as_str(), size);
        }
        params
    }

    fn page_size(&self) -> Option<usize> {
        self.page_size
    }

    fn advance(&self, _consumed: usize, state: &mut PaginationState) {
        state.next_page();
    }
}

//! Pagination types and traits
//!
//! Defines the strategy abstraction, run configuration and per-run state
//! shared by the offset and page-number strategies.

use crate::error::Result;
use crate::query::QueryParams;
use crate::types::JsonValue;
use async_trait::async_trait;

/// Items per page used by list endpoints unless overridden
pub const DEFAULT_PAGE_SIZE: usize = 30;

/// Query parameter carrying the offset
pub const START_PARAM: &str = "start";

/// Query parameter carrying the page size
pub const LIMIT_PARAM: &str = "limit";

// ============================================================================
// Page Fetcher
// ============================================================================

/// Fetches one page of results for a fully built query
///
/// The paginator owns the paging keys (`start`/`limit` or `page`); every
/// other key in the query is passed through untouched.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Perform the request and return the raw response body
    async fn fetch_page(&self, query: &QueryParams) -> Result<JsonValue>;
}

// ============================================================================
// Configuration
// ============================================================================

/// Run parameters for a single paginated listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationConfig {
    /// Items requested per page
    pub page_size: usize,
    /// Offset of the first request
    pub start_offset: usize,
    /// Upper bound on returned items; `None` means everything
    pub max_results: Option<usize>,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            start_offset: 0,
            max_results: None,
        }
    }
}

impl PaginationConfig {
    /// Create a config with default page size and no cap
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page size (clamped to at least one item)
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Set the offset of the first request
    #[must_use]
    pub fn with_start_offset(mut self, start_offset: usize) -> Self {
        self.start_offset = start_offset;
        self
    }

    /// Cap the number of returned items
    #[must_use]
    pub fn with_max_results(mut self, max_results: Option<usize>) -> Self {
        self.max_results = max_results;
        self
    }
}

// ============================================================================
// State
// ============================================================================

/// Tracks pagination state during iteration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginationState {
    /// Current page number (for page-based pagination)
    pub page: usize,
    /// Current offset (for offset-based pagination)
    pub offset: usize,
    /// Pages requested so far
    pub pages_fetched: usize,
    /// Items accepted so far
    pub total_fetched: usize,
    /// Is pagination complete?
    pub done: bool,
}

impl PaginationState {
    /// Create a new pagination state
    pub fn new() -> Self {
        Self::default()
    }

    /// Create state starting at an offset
    pub fn with_offset(offset: usize) -> Self {
        Self {
            offset,
            ..Default::default()
        }
    }

    /// Create state starting at a page number
    pub fn with_page(page: usize) -> Self {
        Self {
            page,
            ..Default::default()
        }
    }

    /// Mark pagination as complete
    pub fn mark_done(&mut self) {
        self.done = true;
    }

    /// Increment page number
    pub fn next_page(&mut self) {
        self.page += 1;
    }

    /// Add offset
    pub fn add_offset(&mut self, amount: usize) {
        self.offset += amount;
    }

    /// Add to total fetched
    pub fn add_fetched(&mut self, count: usize) {
        self.total_fetched += count;
    }
}

// ============================================================================
// Strategy
// ============================================================================

/// Core trait for pagination strategies
pub trait Paginator: Send + Sync {
    /// Paging parameters for the next request
    fn page_params(&self, state: &PaginationState) -> QueryParams;

    /// Items requested per page, when the strategy fixes one.
    ///
    /// A page shorter than this ends the run.
    fn page_size(&self) -> Option<usize>;

    /// Advance the state after `consumed` items were taken from a page
    fn advance(&self, consumed: usize, state: &mut PaginationState);
}

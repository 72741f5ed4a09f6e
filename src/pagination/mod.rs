//! Pagination module
//!
//! Supports: Offset (`start`/`limit`), Page Number (v2 endpoints)
//!
//! # Overview
//!
//! List endpoints return one page per request. The drivers here repeat the
//! request with advancing paging parameters, accumulate the named collection,
//! stop on an empty or short page or at the caller's cap, and finally drop
//! duplicate records that shifted between pages.

mod dedup;
mod fetcher;
mod paginator;
mod strategies;
mod types;

pub use dedup::{dedup_by_id, resolve_item_id, ItemId};
pub use fetcher::EndpointFetcher;
pub use paginator::{
    collect_pages, extract_collection, paginate, paginate_filtered, paginate_with_config,
};
pub use strategies::{OffsetPaginator, PageNumberPaginator};
pub use types::{
    PageFetcher, PaginationConfig, PaginationState, Paginator, DEFAULT_PAGE_SIZE, LIMIT_PARAM,
    START_PARAM,
};

#[cfg(test)]
mod tests;

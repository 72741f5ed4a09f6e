//! Pagination drivers
//!
//! `collect_pages` runs any [`Paginator`] strategy against a [`PageFetcher`]
//! until the data is exhausted or the result cap is reached. `paginate` is the
//! offset-based entry point used by every legacy list endpoint.

use super::dedup::dedup_by_id;
use super::strategies::OffsetPaginator;
use super::types::{
    PageFetcher, PaginationConfig, PaginationState, Paginator, DEFAULT_PAGE_SIZE, LIMIT_PARAM,
    START_PARAM,
};
use crate::error::Result;
use crate::query::QueryParams;
use crate::types::JsonValue;
use tracing::debug;

/// Extract the named collection from a list response
///
/// Mautic returns collections either as arrays or as objects keyed by id;
/// object values are taken in document order. Anything else is empty.
pub fn extract_collection(body: &JsonValue, collection_key: &str) -> Vec<JsonValue> {
    match body.get(collection_key) {
        Some(JsonValue::Array(items)) => items.clone(),
        Some(JsonValue::Object(map)) => map.values().cloned().collect(),
        _ => Vec::new(),
    }
}

/// Fetch every item of a collection with the default page size
///
/// Pages with `start`/`limit`, stops on an empty or short page, honours
/// `max_results`, and deduplicates the accumulated items by id. A fetch
/// error aborts the run; no partial result is returned.
pub async fn paginate(
    fetcher: &dyn PageFetcher,
    collection_key: &str,
    initial_query: &QueryParams,
    max_results: Option<usize>,
) -> Result<Vec<JsonValue>> {
    let config = PaginationConfig::new().with_max_results(max_results);
    paginate_with_config(fetcher, collection_key, initial_query, &config).await
}

/// Like [`paginate`], with an explicit page size and starting offset
pub async fn paginate_with_config(
    fetcher: &dyn PageFetcher,
    collection_key: &str,
    initial_query: &QueryParams,
    config: &PaginationConfig,
) -> Result<Vec<JsonValue>> {
    let paginator = OffsetPaginator::new(config.page_size);
    let state = PaginationState::with_offset(config.start_offset);
    let items = collect_pages(
        &paginator,
        state,
        fetcher,
        |body| extract_collection(body, collection_key),
        initial_query,
        config.max_results,
    )
    .await?;
    Ok(dedup_by_id(items))
}

/// Drive a pagination strategy until exhaustion or the cap
///
/// `extract` turns a response body into the page's items. The run ends when
/// a page is empty, when the strategy's page size is not filled, or when
/// `max_results` items have been accumulated.
pub async fn collect_pages<F>(
    paginator: &dyn Paginator,
    mut state: PaginationState,
    fetcher: &dyn PageFetcher,
    extract: F,
    initial_query: &QueryParams,
    max_results: Option<usize>,
) -> Result<Vec<JsonValue>>
where
    F: Fn(&JsonValue) -> Vec<JsonValue> + Send + Sync,
{
    let mut items: Vec<JsonValue> = Vec::new();
    if max_results == Some(0) {
        return Ok(items);
    }

    let mut query = initial_query.clone();
    while !state.done {
        query.extend(paginator.page_params(&state));
        let body = fetcher.fetch_page(&query).await?;
        state.pages_fetched += 1;

        let mut page = extract(&body);
        let returned = page.len();
        if returned == 0 {
            debug!(pages = state.pages_fetched, "Empty page, pagination complete");
            state.mark_done();
            break;
        }

        let mut capped = false;
        if let Some(max) = max_results {
            let remaining = max.saturating_sub(items.len());
            if returned >= remaining {
                page.truncate(remaining);
                capped = true;
            }
        }

        let consumed = page.len();
        items.extend(page);
        state.add_fetched(consumed);
        paginator.advance(consumed, &mut state);

        debug!(
            page = state.pages_fetched,
            returned,
            consumed,
            total = state.total_fetched,
            "Fetched page"
        );

        let short_page = paginator.page_size().is_some_and(|size| returned < size);
        if capped || short_page {
            state.mark_done();
        }
    }

    Ok(items)
}

/// Page through a collection keeping only items accepted by `predicate`
///
/// Each request asks for at most the number of items still wanted (capped
/// at the default page size) and the offset advances by the requested limit.
/// `limit = None` keeps going until the collection is exhausted. Items are
/// not deduplicated.
pub async fn paginate_filtered<P>(
    fetcher: &dyn PageFetcher,
    collection_key: &str,
    initial_query: &QueryParams,
    limit: Option<usize>,
    predicate: P,
) -> Result<Vec<JsonValue>>
where
    P: Fn(&JsonValue) -> bool + Send + Sync,
{
    let mut query = initial_query.clone();
    let mut offset = query
        .get_text(START_PARAM)
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(0);
    let mut kept: Vec<JsonValue> = Vec::new();

    loop {
        let page_limit = match limit {
            Some(limit) => {
                let remaining = limit.saturating_sub(kept.len());
                if remaining == 0 {
                    break;
                }
                remaining.min(DEFAULT_PAGE_SIZE)
            }
            None => DEFAULT_PAGE_SIZE,
        };

        query.set(START_PARAM, offset);
        query.set(LIMIT_PARAM, page_limit);
        let body = fetcher.fetch_page(&query).await?;
        let page = extract_collection(&body, collection_key);
        let returned = page.len();

        kept.extend(page.into_iter().filter(|item| predicate(item)));
        debug!(offset, returned, kept = kept.len(), "Fetched filtered page");

        if returned < page_limit {
            break;
        }
        offset += page_limit;
    }

    if let Some(limit) = limit {
        kept.truncate(limit);
    }
    Ok(kept)
}

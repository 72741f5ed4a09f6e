//! Tests for pagination module

use super::*;
use crate::error::Error;
use crate::query::QueryParams;
use crate::types::JsonValue;
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Mutex;
use test_case::test_case;

// ============================================================================
// Test Fetcher
// ============================================================================

/// Serves a fixed dataset by `start`/`limit` and records every query
struct MockFetcher {
    items: Vec<JsonValue>,
    keyed_by_id: bool,
    fail_on_call: Option<usize>,
    requests: Mutex<Vec<QueryParams>>,
}

impl MockFetcher {
    fn with_items(items: Vec<JsonValue>) -> Self {
        Self {
            items,
            keyed_by_id: false,
            fail_on_call: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    fn numbered(count: usize) -> Self {
        Self::with_items((1..=count).map(|id| json!({ "id": id })).collect())
    }

    fn keyed(mut self) -> Self {
        self.keyed_by_id = true;
        self
    }

    fn failing_on(mut self, call: usize) -> Self {
        self.fail_on_call = Some(call);
        self
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn requested(&self, key: &str) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|q| q.get_text(key).unwrap_or_default().to_string())
            .collect()
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch_page(&self, query: &QueryParams) -> crate::Result<JsonValue> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(query.clone());
            requests.len()
        };
        if self.fail_on_call == Some(call) {
            return Err(Error::api_status(500, "boom", None));
        }

        let start: usize = query.get_text(START_PARAM).unwrap().parse().unwrap();
        let limit: usize = query.get_text(LIMIT_PARAM).unwrap().parse().unwrap();
        let page: Vec<JsonValue> = self.items.iter().skip(start).take(limit).cloned().collect();

        if self.keyed_by_id {
            let map: serde_json::Map<String, JsonValue> = page
                .into_iter()
                .map(|item| (item["id"].to_string(), item))
                .collect();
            Ok(json!({ "total": self.items.len(), "contacts": map }))
        } else {
            Ok(json!({ "total": self.items.len(), "contacts": page }))
        }
    }
}

/// Serves `?page=N` (1-based) with pages of `size` items
struct PageFetcherStub {
    items: Vec<JsonValue>,
    size: usize,
    pages: Mutex<Vec<String>>,
}

#[async_trait]
impl PageFetcher for PageFetcherStub {
    async fn fetch_page(&self, query: &QueryParams) -> crate::Result<JsonValue> {
        let page: usize = query.get_text("page").unwrap().parse().unwrap();
        self.pages.lock().unwrap().push(page.to_string());
        let data: Vec<JsonValue> = self
            .items
            .iter()
            .skip((page - 1) * self.size)
            .take(self.size)
            .cloned()
            .collect();
        Ok(json!({ "data": data }))
    }
}

fn ids(items: &[JsonValue]) -> Vec<i64> {
    items.iter().map(|item| item["id"].as_i64().unwrap()).collect()
}

// ============================================================================
// PaginationState / Config Tests
// ============================================================================

#[test]
fn test_pagination_state_default() {
    let state = PaginationState::new();
    assert_eq!(state.page, 0);
    assert_eq!(state.offset, 0);
    assert_eq!(state.total_fetched, 0);
    assert!(!state.done);
}

#[test]
fn test_pagination_state_mutations() {
    let mut state = PaginationState::with_offset(10);

    state.next_page();
    assert_eq!(state.page, 1);

    state.add_offset(30);
    assert_eq!(state.offset, 40);

    state.add_fetched(30);
    assert_eq!(state.total_fetched, 30);

    state.mark_done();
    assert!(state.done);
}

#[test]
fn test_pagination_config_defaults() {
    let config = PaginationConfig::default();
    assert_eq!(config.page_size, 30);
    assert_eq!(config.start_offset, 0);
    assert_eq!(config.max_results, None);

    let config = PaginationConfig::new().with_page_size(0);
    assert_eq!(config.page_size, 1);
}

// ============================================================================
// Strategy Tests
// ============================================================================

#[test]
fn test_offset_paginator_params() {
    let paginator = OffsetPaginator::default();
    let mut state = PaginationState::new();

    let params = paginator.page_params(&state);
    assert_eq!(params.get_text("start"), Some("0"));
    assert_eq!(params.get_text("limit"), Some("30"));
    assert_eq!(paginator.page_size(), Some(30));

    paginator.advance(12, &mut state);
    let params = paginator.page_params(&state);
    assert_eq!(params.get_text("start"), Some("12"));
}

#[test]
fn test_page_number_paginator_params() {
    let paginator = PageNumberPaginator::new("page", 1);
    let mut state = PaginationState::new();
    assert_eq!(paginator.page_params(&state).get_text("page"), Some("1"));
    assert_eq!(paginator.page_size(), None);

    paginator.advance(25, &mut state);
    assert_eq!(paginator.page_params(&state).get_text("page"), Some("2"));

    let sized = PageNumberPaginator::new("page", 1).with_page_size("limit", 50);
    let params = sized.page_params(&state);
    assert_eq!(params.get_text("limit"), Some("50"));
    assert_eq!(sized.page_size(), Some(50));
}

// ============================================================================
// Collection Extraction Tests
// ============================================================================

#[test]
fn test_extract_collection_shapes() {
    let array = json!({ "tags": [{ "id": 1 }, { "id": 2 }] });
    assert_eq!(extract_collection(&array, "tags").len(), 2);

    let keyed = json!({ "contacts": { "5": { "id": 5 }, "3": { "id": 3 } } });
    assert_eq!(ids(&extract_collection(&keyed, "contacts")), vec![5, 3]);

    assert!(extract_collection(&json!({ "total": 0 }), "contacts").is_empty());
    assert!(extract_collection(&json!({ "contacts": null }), "contacts").is_empty());
    assert!(extract_collection(&json!({ "contacts": "none" }), "contacts").is_empty());
    assert!(extract_collection(&json!([]), "contacts").is_empty());
}

// ============================================================================
// paginate Tests
// ============================================================================

#[tokio::test]
async fn test_paginate_collects_all_pages() {
    let fetcher = MockFetcher::numbered(75);
    let items = paginate(&fetcher, "contacts", &QueryParams::new(), None)
        .await
        .unwrap();

    assert_eq!(items.len(), 75);
    assert_eq!(ids(&items), (1..=75).collect::<Vec<i64>>());
    assert_eq!(fetcher.requested("start"), vec!["0", "30", "60"]);
    assert_eq!(fetcher.requested("limit"), vec!["30", "30", "30"]);
}

#[tokio::test]
async fn test_paginate_respects_max_results() {
    let fetcher = MockFetcher::numbered(75);
    let items = paginate(&fetcher, "contacts", &QueryParams::new(), Some(40))
        .await
        .unwrap();

    assert_eq!(ids(&items), (1..=40).collect::<Vec<i64>>());
    assert_eq!(fetcher.calls(), 2);
}

#[test_case(45, 2 ; "short second page")]
#[test_case(60, 3 ; "exact multiple needs an empty page")]
#[test_case(0, 1 ; "empty collection")]
#[test_case(29, 1 ; "single short page")]
#[tokio::test]
async fn test_paginate_terminates(total: usize, expected_calls: usize) {
    let fetcher = MockFetcher::numbered(total);
    let items = paginate(&fetcher, "contacts", &QueryParams::new(), None)
        .await
        .unwrap();

    assert_eq!(items.len(), total);
    assert_eq!(fetcher.calls(), expected_calls);
}

#[tokio::test]
async fn test_paginate_cap_on_page_boundary_stops_without_extra_fetch() {
    let fetcher = MockFetcher::numbered(75);
    let items = paginate(&fetcher, "contacts", &QueryParams::new(), Some(30))
        .await
        .unwrap();

    assert_eq!(items.len(), 30);
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn test_paginate_zero_cap_fetches_nothing() {
    let fetcher = MockFetcher::numbered(10);
    let items = paginate(&fetcher, "contacts", &QueryParams::new(), Some(0))
        .await
        .unwrap();

    assert!(items.is_empty());
    assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
async fn test_paginate_keeps_caller_query() {
    let fetcher = MockFetcher::numbered(5);
    let query = QueryParams::new()
        .with("search", "segment:1")
        .with("orderBy", "id")
        .with("start", "999");
    paginate(&fetcher, "contacts", &query, None).await.unwrap();

    let sent = fetcher.requests.lock().unwrap()[0].clone();
    assert_eq!(sent.get_text("search"), Some("segment:1"));
    assert_eq!(sent.get_text("orderBy"), Some("id"));
    assert_eq!(sent.get_text("start"), Some("0"));
}

#[tokio::test]
async fn test_paginate_reads_id_keyed_collections() {
    let fetcher = MockFetcher::numbered(35).keyed();
    let items = paginate(&fetcher, "contacts", &QueryParams::new(), None)
        .await
        .unwrap();

    assert_eq!(items.len(), 35);
    assert_eq!(fetcher.calls(), 2);
}

#[tokio::test]
async fn test_paginate_propagates_fetch_error() {
    let fetcher = MockFetcher::numbered(75).failing_on(2);
    let err = paginate(&fetcher, "contacts", &QueryParams::new(), None)
        .await
        .unwrap_err();

    assert_eq!(err.http_code(), Some(500));
    assert_eq!(fetcher.calls(), 2);
}

#[tokio::test]
async fn test_paginate_removes_records_repeated_across_pages() {
    // Record 30 shifts onto the second page after an insert upstream.
    let mut items: Vec<JsonValue> = (1..=30).map(|id| json!({ "id": id })).collect();
    items.push(json!({ "id": 30 }));
    items.extend((31..=40).map(|id| json!({ "id": id })));
    let fetcher = MockFetcher::with_items(items);

    let result = paginate(&fetcher, "contacts", &QueryParams::new(), None)
        .await
        .unwrap();

    assert_eq!(ids(&result), (1..=40).collect::<Vec<i64>>());
}

#[tokio::test]
async fn test_paginate_with_config_uses_offset_and_page_size() {
    let fetcher = MockFetcher::numbered(250);
    let config = PaginationConfig::new()
        .with_page_size(100)
        .with_start_offset(50);
    let items = paginate_with_config(&fetcher, "contacts", &QueryParams::new(), &config)
        .await
        .unwrap();

    assert_eq!(items.len(), 200);
    assert_eq!(fetcher.requested("start"), vec!["50", "150", "250"]);
    assert_eq!(fetcher.requested("limit"), vec!["100", "100", "100"]);
}

// ============================================================================
// collect_pages Tests
// ============================================================================

#[tokio::test]
async fn test_collect_pages_by_page_number_until_empty() {
    let fetcher = PageFetcherStub {
        items: (1..=25).map(|id| json!({ "id": id })).collect(),
        size: 10,
        pages: Mutex::new(Vec::new()),
    };
    let paginator = PageNumberPaginator::new("page", 1);

    let items = collect_pages(
        &paginator,
        PaginationState::new(),
        &fetcher,
        |body| extract_collection(body, "data"),
        &QueryParams::new(),
        None,
    )
    .await
    .unwrap();

    assert_eq!(items.len(), 25);
    assert_eq!(*fetcher.pages.lock().unwrap(), vec!["1", "2", "3", "4"]);
}

// ============================================================================
// Dedup Tests
// ============================================================================

#[test]
fn test_resolve_item_id() {
    assert_eq!(resolve_item_id(&json!({ "id": 7 })), Some(ItemId::Int(7)));
    assert_eq!(
        resolve_item_id(&json!({ "id": "abc" })),
        Some(ItemId::Str("abc".to_string()))
    );
    assert_eq!(
        resolve_item_id(&json!({ "fields": { "id": 9 } })),
        Some(ItemId::Int(9))
    );
    assert_eq!(
        resolve_item_id(&json!({ "id": null, "fields": { "id": 3 } })),
        Some(ItemId::Int(3))
    );
    assert_eq!(resolve_item_id(&json!({ "name": "x" })), None);
    assert_eq!(resolve_item_id(&json!("plain")), None);
}

#[test]
fn test_dedup_keeps_first_occurrence() {
    let items = vec![
        json!({ "id": 1, "v": "first" }),
        json!({ "id": 2 }),
        json!({ "id": 1, "v": "second" }),
        json!({ "fields": { "id": 2 } }),
    ];
    let result = dedup_by_id(items);
    assert_eq!(result, vec![json!({ "id": 1, "v": "first" }), json!({ "id": 2 })]);
}

#[test]
fn test_dedup_keeps_items_without_identity() {
    let items = vec![
        json!({ "name": "a" }),
        json!({ "name": "a" }),
        json!(42),
        json!({ "id": 7 }),
        json!({ "id": "7" }),
    ];
    assert_eq!(dedup_by_id(items.clone()), items);
}

#[test]
fn test_dedup_is_idempotent() {
    let items = vec![json!({ "id": 1 }), json!({ "id": 1 }), json!({ "x": 1 })];
    let once = dedup_by_id(items);
    let twice = dedup_by_id(once.clone());
    assert_eq!(once, twice);
}

// ============================================================================
// paginate_filtered Tests
// ============================================================================

#[tokio::test]
async fn test_paginate_filtered_fills_limit_across_pages() {
    let fetcher = MockFetcher::numbered(100);
    let even = |item: &JsonValue| item["id"].as_i64().unwrap() % 2 == 0;

    let items = paginate_filtered(&fetcher, "contacts", &QueryParams::new(), Some(20), even)
        .await
        .unwrap();

    assert_eq!(ids(&items), (1..=20).map(|n| n * 2).collect::<Vec<i64>>());
    assert_eq!(
        fetcher.requested("start"),
        vec!["0", "20", "30", "35", "38", "39"]
    );
    assert_eq!(fetcher.requested("limit"), vec!["20", "10", "5", "3", "1", "1"]);
}

#[tokio::test]
async fn test_paginate_filtered_stops_on_short_page() {
    let fetcher = MockFetcher::numbered(12);
    let items = paginate_filtered(&fetcher, "contacts", &QueryParams::new(), Some(30), |_| false)
        .await
        .unwrap();

    assert!(items.is_empty());
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn test_paginate_filtered_without_limit_reads_everything() {
    let fetcher = MockFetcher::numbered(65);
    let query = QueryParams::new().with("start", "10");
    let items = paginate_filtered(&fetcher, "contacts", &query, None, |_| true)
        .await
        .unwrap();

    assert_eq!(items.len(), 55);
    assert_eq!(fetcher.requested("start"), vec!["10", "40", "70"]);
}

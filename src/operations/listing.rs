//! Shared list-endpoint plumbing
//!
//! Every `getAll` either pages through the whole collection or fetches a
//! single page of `limit` items.

use super::params::Params;
use crate::error::Result;
use crate::http::{ApiRequest, MauticApi};
use crate::pagination::{extract_collection, paginate, EndpointFetcher, LIMIT_PARAM};
use crate::query::{QueryParams, QueryValue};
use crate::types::{JsonObject, JsonValue, SortDirection};
use tracing::debug;

/// Page size used when the caller gives no `limit`
pub const DEFAULT_LIST_LIMIT: usize = 30;

/// Option keys copied verbatim into list queries
const QUERY_OPTION_KEYS: [&str; 6] = [
    "search",
    "orderBy",
    "orderByDir",
    "publishedOnly",
    "minimal",
    "start",
];

/// How much of a collection to fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMode {
    /// Page through everything, optionally capped
    All { max_results: Option<usize> },
    /// One request for at most `limit` items
    Page { limit: usize },
}

impl ListMode {
    /// Read `returnAll` and `limit` from the parameters
    pub fn from_params(params: &Params<'_>, default_limit: usize) -> Result<Self> {
        let limit = params.optional_usize("limit")?;
        if params.optional_bool("returnAll", false)? {
            Ok(Self::All { max_results: limit })
        } else {
            Ok(Self::Page {
                limit: limit.unwrap_or(default_limit),
            })
        }
    }
}

/// Copy the standard list options into a query
pub fn build_query_from_options(options: &JsonObject) -> QueryParams {
    let mut query = QueryParams::new();
    for key in QUERY_OPTION_KEYS {
        let value = options.get(key).and_then(QueryValue::from_json);
        if let Some(value) = value.filter(|v| !v.is_empty_text()) {
            query.set(key, value);
        }
    }
    query
}

/// Order by `id` ascending unless the caller chose otherwise
pub fn apply_default_order(query: &mut QueryParams) {
    query.set_default("orderBy", "id");
    query.set_default("orderByDir", SortDirection::Asc.as_str());
}

/// Fetch a collection from a list endpoint
pub async fn fetch_list(
    api: &dyn MauticApi,
    endpoint: &str,
    collection_key: &str,
    mut query: QueryParams,
    mode: ListMode,
) -> Result<Vec<JsonValue>> {
    match mode {
        ListMode::All { max_results } => {
            let fetcher = EndpointFetcher::get(api, endpoint);
            paginate(&fetcher, collection_key, &query, max_results).await
        }
        ListMode::Page { limit } => {
            query.set(LIMIT_PARAM, limit);
            let body = api
                .request(ApiRequest::get(endpoint).with_query(query))
                .await?;
            let items = extract_collection(&body, collection_key);
            debug!(endpoint, count = items.len(), "Fetched single page");
            Ok(items)
        }
    }
}

#[cfg(test)]
mod listing_tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_query_from_options() {
        let options = match json!({
            "search": "email:*@x.com",
            "orderBy": "",
            "publishedOnly": true,
            "start": 10,
            "unrelated": "x"
        }) {
            JsonValue::Object(map) => map,
            _ => unreachable!(),
        };

        let mut query = build_query_from_options(&options);
        assert_eq!(query.get_text("search"), Some("email:*@x.com"));
        assert_eq!(query.get_text("publishedOnly"), Some("1"));
        assert_eq!(query.get_text("start"), Some("10"));
        assert!(!query.contains("orderBy"));
        assert!(!query.contains("unrelated"));

        apply_default_order(&mut query);
        assert_eq!(query.get_text("orderBy"), Some("id"));
        assert_eq!(query.get_text("orderByDir"), Some("asc"));
    }

    #[test]
    fn test_list_mode_from_params() {
        let all = match json!({ "returnAll": true, "limit": 5 }) {
            JsonValue::Object(map) => map,
            _ => unreachable!(),
        };
        assert_eq!(
            ListMode::from_params(&Params::new(&all), 30).unwrap(),
            ListMode::All { max_results: Some(5) }
        );

        let empty = JsonObject::new();
        assert_eq!(
            ListMode::from_params(&Params::new(&empty), 50).unwrap(),
            ListMode::Page { limit: 50 }
        );
    }
}

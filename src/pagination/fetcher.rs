//! Page fetcher bound to a single API endpoint

use super::types::PageFetcher;
use crate::error::Result;
use crate::http::{ApiRequest, MauticApi};
use crate::query::QueryParams;
use crate::types::{JsonValue, Method};
use async_trait::async_trait;

/// Fetches pages by calling one endpoint with the paginator's query
pub struct EndpointFetcher<'a> {
    api: &'a dyn MauticApi,
    method: Method,
    endpoint: String,
    body: Option<JsonValue>,
}

impl<'a> EndpointFetcher<'a> {
    /// Fetch pages with `GET {endpoint}`
    pub fn get(api: &'a dyn MauticApi, endpoint: impl Into<String>) -> Self {
        Self {
            api,
            method: Method::GET,
            endpoint: endpoint.into(),
            body: None,
        }
    }

    /// Use another method for the page requests
    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Send a JSON body with every page request
    #[must_use]
    pub fn with_body(mut self, body: JsonValue) -> Self {
        self.body = Some(body);
        self
    }
}

#[async_trait]
impl PageFetcher for EndpointFetcher<'_> {
    async fn fetch_page(&self, query: &QueryParams) -> Result<JsonValue> {
        let mut request = ApiRequest::new(self.method, self.endpoint.as_str()).with_query(query.clone());
        if let Some(body) = &self.body {
            request = request.with_body(body.clone());
        }
        self.api.request(request).await
    }
}

//! Tag operations
//!
//! Mautic 7 serves tags from `/api/v2/tags` with JSON:API (or plain JSON /
//! Hydra) documents and page-number pagination. Older instances use the
//! legacy endpoints handled by the CRUD table.

use super::listing::{build_query_from_options, DEFAULT_LIST_LIMIT};
use super::params::Params;
use super::postprocess::convert_numeric_strings;
use super::resources::TAG;
use super::types::OperationContext;
use crate::error::{Error, Result};
use crate::http::ApiRequest;
use crate::pagination::{collect_pages, EndpointFetcher, PageNumberPaginator, PaginationState};
use crate::types::{JsonObject, JsonValue, Method, MauticVersion};
use serde_json::json;

/// Collection path of the v2 API
pub const V2_TAGS_PATH: &str = "/v2/tags";

const CONTENT_TYPE: &str = "Content-Type";
const JSON_CONTENT: &str = "application/json";
const MERGE_PATCH_CONTENT: &str = "application/merge-patch+json";

/// Run a tag operation against the endpoints of the instance's version
pub async fn execute(
    ctx: &OperationContext<'_>,
    operation: &str,
    params: &Params<'_>,
) -> Result<JsonValue> {
    match ctx.version {
        MauticVersion::V6 => TAG.execute(ctx, operation, params).await,
        MauticVersion::V7 => execute_v2(ctx, operation, params).await,
    }
}

async fn execute_v2(
    ctx: &OperationContext<'_>,
    operation: &str,
    params: &Params<'_>,
) -> Result<JsonValue> {
    match operation {
        "create" => {
            let mut body = JsonObject::new();
            body.insert("tag".into(), json!(params.required_str("tag")?));
            if let Some(description) = params.optional_str("description")? {
                body.insert("description".into(), json!(description));
            }
            let response = ctx
                .api
                .request(
                    ApiRequest::new(Method::POST, V2_TAGS_PATH)
                        .with_body(JsonValue::Object(body))
                        .with_header(CONTENT_TYPE, JSON_CONTENT),
                )
                .await?;
            Ok(normalise_tag(&response))
        }
        "update" => {
            let id = params.required_str("tagId")?;
            let fields = params.object("updateFields");
            let mut body = JsonObject::new();
            for key in ["tag", "description"] {
                let value = match fields {
                    Some(fields) => fields.optional_str(key)?,
                    None => None,
                }
                .or(params.optional_str(key)?);
                if let Some(value) = value {
                    body.insert(key.into(), json!(value));
                }
            }

            let (method, content_type) = if params.optional_bool("createIfNotFound", false)? {
                (Method::PUT, JSON_CONTENT)
            } else {
                (Method::PATCH, MERGE_PATCH_CONTENT)
            };
            let response = ctx
                .api
                .request(
                    ApiRequest::new(method, format!("{V2_TAGS_PATH}/{id}"))
                        .with_body(JsonValue::Object(body))
                        .with_header(CONTENT_TYPE, content_type),
                )
                .await?;
            Ok(normalise_tag(&response))
        }
        "get" => {
            let id = params.required_str("tagId")?;
            let response = ctx
                .api
                .request(ApiRequest::get(format!("{V2_TAGS_PATH}/{id}")))
                .await?;
            Ok(normalise_tag(&response))
        }
        "getAll" => get_all_v2(ctx, params).await,
        "delete" => {
            let id = params.required_str("tagId")?;
            let response = ctx
                .api
                .request(ApiRequest::new(Method::DELETE, format!("{V2_TAGS_PATH}/{id}")))
                .await?;
            Ok(if response.is_null() {
                json!({ "success": true })
            } else {
                response
            })
        }
        other => Err(Error::unsupported_operation("Tag", other)),
    }
}

async fn get_all_v2(ctx: &OperationContext<'_>, params: &Params<'_>) -> Result<JsonValue> {
    let query = build_query_from_options(&params.optional_object("options")?);
    let limit = if params.optional_bool("returnAll", false)? {
        params.optional_usize("limit")?
    } else {
        Some(params.optional_usize("limit")?.unwrap_or(DEFAULT_LIST_LIMIT))
    };

    // Page size is chosen by the server, so only empty pages end the run
    let paginator = PageNumberPaginator::new("page", 1);
    let fetcher = EndpointFetcher::get(ctx.api, V2_TAGS_PATH);
    let items = collect_pages(
        &paginator,
        PaginationState::new(),
        &fetcher,
        normalise_tag_collection,
        &query,
        limit,
    )
    .await?;
    Ok(JsonValue::Array(items))
}

/// Flatten one v2 tag document into a plain record
pub fn normalise_tag(response: &JsonValue) -> JsonValue {
    let record = match response {
        JsonValue::Null => return json!({}),
        JsonValue::Array(items) => items.first().cloned().unwrap_or_else(|| json!({})),
        _ => {
            if let Some(data) = response.get("data").filter(|d| d.is_object()) {
                flatten_resource(data)
            } else if response.get("attributes").is_some() {
                flatten_resource(response)
            } else {
                response.clone()
            }
        }
    };
    convert_numeric_strings(record)
}

/// Flatten a v2 tag collection (JSON:API `data`, plain array or Hydra `member`)
pub fn normalise_tag_collection(response: &JsonValue) -> Vec<JsonValue> {
    let entries = match response {
        JsonValue::Array(items) => return items.iter().cloned().map(convert_numeric_strings).collect(),
        _ => response
            .get("data")
            .and_then(JsonValue::as_array)
            .map(|data| data.iter().map(flatten_resource).collect::<Vec<_>>())
            .or_else(|| {
                response
                    .get("member")
                    .and_then(JsonValue::as_array)
                    .cloned()
            }),
    };
    entries
        .unwrap_or_default()
        .into_iter()
        .map(convert_numeric_strings)
        .collect()
}

/// `{ id, attributes: {...} }` -> `{ id, ...attributes }`
fn flatten_resource(resource: &JsonValue) -> JsonValue {
    let mut record = JsonObject::new();
    record.insert(
        "id".into(),
        resource.get("id").cloned().unwrap_or(JsonValue::Null),
    );
    if let Some(JsonValue::Object(attributes)) = resource.get("attributes") {
        for (key, value) in attributes {
            record.insert(key.clone(), value.clone());
        }
    }
    JsonValue::Object(record)
}

//! Statistics tables

use super::params::Params;
use super::postprocess::convert_numeric_strings;
use super::types::{OperationContext, Resource};
use crate::error::{Error, Result};
use crate::filter::{compile_where, FilterNode};
use crate::http::ApiRequest;
use crate::pagination::{
    paginate_with_config, EndpointFetcher, PaginationConfig, LIMIT_PARAM, START_PARAM,
};
use crate::query::QueryParams;
use crate::types::{JsonValue, SortDirection};
use tracing::warn;

/// Rows requested per page when reading a whole table
pub const STATS_PAGE_SIZE: usize = 100;

/// Run a stats operation
pub async fn execute(
    ctx: &OperationContext<'_>,
    operation: &str,
    params: &Params<'_>,
) -> Result<JsonValue> {
    match operation {
        "getAvailableTables" => {
            let response = ctx.api.request(ApiRequest::get("/stats")).await?;
            Ok(convert_numeric_strings(response))
        }
        "get" => get_table(ctx, params).await,
        other => Err(Error::unsupported_operation(
            Resource::Stats.display_name(),
            other,
        )),
    }
}

async fn get_table(ctx: &OperationContext<'_>, params: &Params<'_>) -> Result<JsonValue> {
    let table = params.required_str("table")?;
    let return_all = params.optional_bool("returnAll", false)?;
    let options = params.object("additionalOptions");

    let start = match options {
        Some(options) => options.optional_usize("start")?.unwrap_or(0),
        None => 0,
    };
    let query = table_query(options)?;
    let endpoint = format!("/stats/{table}");

    let rows = if return_all {
        let config = PaginationConfig::new()
            .with_page_size(STATS_PAGE_SIZE)
            .with_start_offset(start);
        let fetcher = EndpointFetcher::get(ctx.api, endpoint.as_str());
        paginate_with_config(&fetcher, "stats", &query, &config).await?
    } else {
        let limit = params.required_usize("limit")?;
        let query = query.with(START_PARAM, start).with(LIMIT_PARAM, limit);
        let response = ctx
            .api
            .request(ApiRequest::get(endpoint.as_str()).with_query(query))
            .await?;
        match response.get("stats") {
            Some(JsonValue::Array(rows)) => rows.clone(),
            Some(JsonValue::Object(rows)) => rows.values().cloned().collect(),
            _ => Vec::new(),
        }
    };

    Ok(convert_numeric_strings(JsonValue::Array(rows)))
}

/// Ordering and `where` conditions for a table request
fn table_query(options: Option<Params<'_>>) -> Result<QueryParams> {
    let mut query = QueryParams::new();
    let Some(options) = options else {
        return Ok(query);
    };

    if let Some(order_by) = options.optional_str("orderBy")? {
        let direction = options
            .optional_str("orderByDir")?
            .unwrap_or_else(|| SortDirection::Asc.as_str().to_string());
        query.set("order[0][col]", order_by);
        query.set("order[0][dir]", direction);
    }

    match options.optional_json("where") {
        Some(JsonValue::Array(conditions)) => {
            match FilterNode::parse_list(&JsonValue::Array(conditions)) {
                Ok(nodes) => query.extend(compile_where(&nodes)),
                Err(e) => warn!(error = %e, "Ignoring unusable stats where conditions"),
            }
        }
        Some(_) => warn!("Ignoring stats where conditions that are not a list"),
        None => {}
    }

    Ok(query)
}

//! Campaign operations beyond plain CRUD

use super::listing::{build_query_from_options, fetch_list, ListMode, DEFAULT_LIST_LIMIT};
use super::params::Params;
use super::resources::CAMPAIGN;
use super::types::OperationContext;
use crate::error::Result;
use crate::http::ApiRequest;
use crate::types::{JsonValue, Method};

/// Run a campaign operation
pub async fn execute(
    ctx: &OperationContext<'_>,
    operation: &str,
    params: &Params<'_>,
) -> Result<JsonValue> {
    match operation {
        "clone" => clone_campaign(ctx, params).await,
        "getContacts" => get_contacts(ctx, params).await,
        _ => CAMPAIGN.execute(ctx, operation, params).await,
    }
}

async fn clone_campaign(ctx: &OperationContext<'_>, params: &Params<'_>) -> Result<JsonValue> {
    let id = params.required_str("campaignId")?;
    let response = ctx
        .api
        .request(ApiRequest::new(Method::POST, format!("/campaigns/{id}/clone")))
        .await?;
    Ok(response
        .get("campaign")
        .cloned()
        .unwrap_or(response))
}

async fn get_contacts(ctx: &OperationContext<'_>, params: &Params<'_>) -> Result<JsonValue> {
    let id = params.required_str("campaignId")?;
    let query = build_query_from_options(&params.optional_object("options")?);
    let mode = ListMode::from_params(params, DEFAULT_LIST_LIMIT)?;
    let contacts = fetch_list(
        ctx.api,
        &format!("/campaigns/{id}/contacts"),
        "contacts",
        query,
        mode,
    )
    .await?;
    Ok(JsonValue::Array(contacts))
}

//! Contact operations

use super::listing::{apply_default_order, build_query_from_options, fetch_list, ListMode};
use super::params::{string_list, Params};
use super::postprocess::{
    convert_all, convert_numeric_strings, process_contact_fields, sanitize_body, snake_case,
    validate_email,
};
use super::resources::merge_fields;
use super::types::{OperationContext, Resource};
use crate::error::{Error, Result};
use crate::filter::{
    build_search_filter, combine_search, compile_where, retain_complete, FilterNode, MatchType,
};
use crate::http::ApiRequest;
use crate::pagination::{paginate, paginate_filtered, EndpointFetcher};
use crate::query::{QueryParams, QueryValue};
use crate::types::{JsonObject, JsonValue, Method, SortDirection};
use serde_json::json;
use tracing::debug;

const CONTACTS_PATH: &str = "/contacts";

/// Run a contact operation
pub async fn execute(
    ctx: &OperationContext<'_>,
    operation: &str,
    params: &Params<'_>,
) -> Result<JsonValue> {
    match operation {
        "create" => create(ctx, params).await,
        "update" => update(ctx, params).await,
        "get" => get(ctx, params).await,
        "getAll" => get_all(ctx, params).await,
        "delete" => delete(ctx, params).await,
        "sendEmail" => send_email(ctx, params).await,
        "editPoints" | "editContactPoint" => edit_points(ctx, params).await,
        "editDoNotContact" | "editDoNotContactList" => edit_do_not_contact(ctx, params).await,
        "addUtm" => add_utm(ctx, params).await,
        "removeUtm" => remove_utm(ctx, params).await,
        "getActivity" => {
            let id = params.required_str("contactId")?;
            get_activity(ctx, params, &format!("{CONTACTS_PATH}/{id}/activity")).await
        }
        "getAllActivity" => get_activity(ctx, params, "/contacts/activity").await,
        "getNotes" => {
            let id = params.required_str("contactId")?;
            let query = QueryParams::from_json_object(&params.optional_object("options")?);
            list_related(ctx, &format!("{CONTACTS_PATH}/{id}/notes"), "notes", query).await
        }
        "getDevices" => related(ctx, params, "devices", "devices").await,
        "getCompanies" => related(ctx, params, "companies", "companies").await,
        "getCampaigns" => related(ctx, params, "campaigns", "campaigns").await,
        "getSegments" => related(ctx, params, "segments", "lists").await,
        "addToSegments" => change_membership(ctx, params, "segments", "segmentIds", "add").await,
        "removeFromSegments" => {
            change_membership(ctx, params, "segments", "segmentIds", "remove").await
        }
        "addToCampaigns" => {
            change_membership(ctx, params, "campaigns", "campaignIds", "add").await
        }
        "removeFromCampaigns" => {
            change_membership(ctx, params, "campaigns", "campaignIds", "remove").await
        }
        "getOwners" => list_endpoint(ctx, "/contacts/list/owners").await,
        "getFields" => list_endpoint(ctx, "/contacts/list/fields").await,
        other => Err(Error::unsupported_operation(
            Resource::Contact.display_name(),
            other,
        )),
    }
}

// ============================================================================
// Output Options
// ============================================================================

/// `options.rawData` and `options.fieldsToReturn`
struct OutputOptions {
    raw: bool,
    fields_to_return: Vec<String>,
}

impl OutputOptions {
    fn from_options(options: &JsonObject) -> Result<Self> {
        let params = Params::new(options);
        Ok(Self {
            raw: params.optional_bool("rawData", false)?,
            fields_to_return: params.optional_string_list("fieldsToReturn")?,
        })
    }

    fn apply(&self, contacts: Vec<JsonValue>) -> Vec<JsonValue> {
        process_contact_fields(contacts, self.raw, &self.fields_to_return)
    }
}

// ============================================================================
// CRUD
// ============================================================================

async fn create(ctx: &OperationContext<'_>, params: &Params<'_>) -> Result<JsonValue> {
    let output = OutputOptions::from_options(&params.optional_object("options")?)?;
    let additional = params.optional_object("additionalFields")?;

    let mut body = if params.optional_bool("jsonParameters", false)? {
        json_body(params, "bodyJson")?
    } else {
        let mut body = JsonObject::new();
        for (param, key) in CONTACT_BODY_FIELDS {
            if let Some(value) = params.value(param) {
                body.insert(key.to_string(), value.clone());
            }
        }
        body
    };
    add_contact_fields(&mut body, &additional);

    let body = sanitize_body(body);
    validate_email(&body)?;
    debug!(fields = body.len(), "Creating contact");

    let response = ctx
        .api
        .request(ApiRequest::new(Method::POST, "/contacts/new").with_body(JsonValue::Object(body)))
        .await?;
    Ok(JsonValue::Array(output.apply(vec![contact_or_response(response)])))
}

async fn update(ctx: &OperationContext<'_>, params: &Params<'_>) -> Result<JsonValue> {
    let output = OutputOptions::from_options(&params.optional_object("options")?)?;
    let update_fields = params.optional_object("updateFields")?;
    let id = params.required_str("contactId")?;
    let fields = Params::new(&update_fields);

    let mut body = if fields.value("bodyJson").is_some() {
        json_body(&fields, "bodyJson")?
    } else {
        let mut body = JsonObject::new();
        for (param, key) in CONTACT_BODY_FIELDS {
            if let Some(value) = fields.value(param).filter(|v| v.as_str() != Some("")) {
                body.insert(key.to_string(), value.clone());
            }
        }
        body
    };
    add_contact_fields(&mut body, &update_fields);

    let response = ctx
        .api
        .request(
            ApiRequest::new(Method::PATCH, format!("{CONTACTS_PATH}/{id}/edit"))
                .with_body(JsonValue::Object(body)),
        )
        .await?;
    Ok(JsonValue::Array(output.apply(vec![contact_or_response(response)])))
}

async fn get(ctx: &OperationContext<'_>, params: &Params<'_>) -> Result<JsonValue> {
    let output = OutputOptions::from_options(&params.optional_object("options")?)?;
    let id = params.required_str("contactId")?;
    let response = ctx
        .api
        .request(ApiRequest::get(format!("{CONTACTS_PATH}/{id}")))
        .await?;
    let contacts = output.apply(vec![contact_or_response(response)]);
    Ok(JsonValue::Array(convert_all(contacts)))
}

async fn delete(ctx: &OperationContext<'_>, params: &Params<'_>) -> Result<JsonValue> {
    let output = OutputOptions::from_options(&params.optional_object("options")?)?;
    let id = params.required_str("contactId")?;
    let response = ctx
        .api
        .request(ApiRequest::new(Method::DELETE, format!("{CONTACTS_PATH}/{id}/delete")))
        .await?;

    let record = match response.get("contact") {
        Some(contact) => contact.clone(),
        None => json!({ "success": true, "message": "Contact deleted successfully." }),
    };
    Ok(JsonValue::Array(output.apply(vec![record])))
}

// ============================================================================
// Listing
// ============================================================================

/// Which do-not-contact entries a listing is restricted to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DncFilter {
    Email,
    Sms,
    Any,
}

impl DncFilter {
    fn from_options(options: &Params<'_>) -> Result<Option<Self>> {
        if options.optional_bool("emailDncOnly", false)? {
            Ok(Some(Self::Email))
        } else if options.optional_bool("smsDncOnly", false)? {
            Ok(Some(Self::Sms))
        } else if options.optional_bool("anyDncOnly", false)? {
            Ok(Some(Self::Any))
        } else {
            Ok(None)
        }
    }

    /// Check a contact's `doNotContact` entries
    pub fn matches(self, contact: &JsonValue) -> bool {
        let channels: Vec<&str> = contact
            .get("doNotContact")
            .and_then(JsonValue::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|e| e.get("channel").and_then(JsonValue::as_str))
                    .collect()
            })
            .unwrap_or_default();
        let email = channels.contains(&"email");
        let sms = channels.contains(&"sms");
        match self {
            DncFilter::Email => email,
            DncFilter::Sms => sms,
            DncFilter::Any => email || sms,
        }
    }
}

/// Build the `search` expression from structured filters and the raw search
fn contact_search(options: &Params<'_>) -> Result<Option<String>> {
    let match_type = |name: &str| -> Result<MatchType> {
        match options.optional_str(name)? {
            Some(value) => value.parse(),
            None => Ok(MatchType::Any),
        }
    };

    let filters = [
        ("segments", "segment", match_type("segmentMatchType")?),
        ("tags", "tag", match_type("tagMatchType")?),
        ("owners", "owner", MatchType::Any),
        ("stages", "stage", MatchType::Any),
        ("campaigns", "campaign", MatchType::Any),
    ];

    let mut parts = Vec::new();
    for (option, filter_type, match_type) in filters {
        let values = options.optional_string_list(option)?;
        if let Some(part) = build_search_filter(&values, filter_type, match_type) {
            parts.push(part);
        }
    }

    let raw = options.optional_str("search")?;
    Ok(combine_search(&parts, raw.as_deref()))
}

/// Compile `options.where` keeping only conditions with a column and value
fn contact_where(options: &Params<'_>) -> Result<QueryParams> {
    match options.value("where") {
        None => Ok(QueryParams::new()),
        Some(value) => {
            let nodes = retain_complete(FilterNode::parse_list(value)?);
            Ok(compile_where(&nodes))
        }
    }
}

/// Query for a contact listing
pub fn contact_list_query(options: &JsonObject) -> Result<QueryParams> {
    let view = Params::new(options);
    let mut query = build_query_from_options(options);

    if let Some(search) = contact_search(&view)? {
        query.set("search", search);
    }
    apply_default_order(&mut query);
    if let Some(order_by) = query.get_text("orderBy").map(snake_case) {
        query.set("orderBy", order_by);
    }
    query.extend(contact_where(&view)?);
    Ok(query)
}

async fn get_all(ctx: &OperationContext<'_>, params: &Params<'_>) -> Result<JsonValue> {
    let options = params.optional_object("options")?;
    let output = OutputOptions::from_options(&options)?;
    let query = contact_list_query(&options)?;
    let mode = ListMode::from_params(params, super::listing::DEFAULT_LIST_LIMIT)?;

    let contacts = match DncFilter::from_options(&Params::new(&options))? {
        Some(dnc) => {
            let limit = match mode {
                ListMode::All { .. } => None,
                ListMode::Page { limit } => Some(limit),
            };
            let fetcher = EndpointFetcher::get(ctx.api, CONTACTS_PATH);
            paginate_filtered(&fetcher, "contacts", &query, limit, |c| dnc.matches(c)).await?
        }
        None => fetch_list(ctx.api, CONTACTS_PATH, "contacts", query, mode).await?,
    };

    Ok(JsonValue::Array(convert_all(output.apply(contacts))))
}

async fn get_activity(
    ctx: &OperationContext<'_>,
    params: &Params<'_>,
    endpoint: &str,
) -> Result<JsonValue> {
    let options = params.optional_object("options")?;
    let view = Params::new(&options);

    let mut filters: Vec<(String, QueryValue)> = Vec::new();
    if let Some(search) = view.optional_str("search")? {
        filters.push(("search".into(), QueryValue::Text(search)));
    }
    for key in ["includeEvents", "excludeEvents"] {
        let events = view.optional_string_list(key)?;
        if !events.is_empty() {
            filters.push((key.into(), QueryValue::list(events)));
        }
    }
    for key in ["dateFrom", "dateTo"] {
        if let Some(date) = view.optional_str(key)? {
            filters.push((key.into(), QueryValue::Text(date)));
        }
    }

    let mut query = QueryParams::new().with("filters", QueryValue::Object(filters));
    if let Some(order_by) = view.optional_str("orderBy")? {
        let direction = view
            .optional_str("orderByDir")?
            .unwrap_or_else(|| SortDirection::Asc.as_str().to_string());
        query.set("order", QueryValue::list([order_by, direction]));
    }

    let fetcher = EndpointFetcher::get(ctx.api, endpoint);
    let events = paginate(&fetcher, "events", &query, view.optional_usize("limit")?).await?;
    Ok(JsonValue::Array(convert_all(events)))
}

async fn related(
    ctx: &OperationContext<'_>,
    params: &Params<'_>,
    path: &str,
    collection_key: &str,
) -> Result<JsonValue> {
    let id = params.required_str("contactId")?;
    list_related(
        ctx,
        &format!("{CONTACTS_PATH}/{id}/{path}"),
        collection_key,
        QueryParams::new(),
    )
    .await
}

async fn list_related(
    ctx: &OperationContext<'_>,
    endpoint: &str,
    collection_key: &str,
    query: QueryParams,
) -> Result<JsonValue> {
    let fetcher = EndpointFetcher::get(ctx.api, endpoint);
    let items = paginate(&fetcher, collection_key, &query, None).await?;
    Ok(JsonValue::Array(convert_all(items)))
}

async fn list_endpoint(ctx: &OperationContext<'_>, endpoint: &str) -> Result<JsonValue> {
    let response = ctx.api.request(ApiRequest::get(endpoint)).await?;
    Ok(convert_numeric_strings(response))
}

// ============================================================================
// Actions
// ============================================================================

async fn send_email(ctx: &OperationContext<'_>, params: &Params<'_>) -> Result<JsonValue> {
    let contact_id = params.required_str("contactId")?;
    let email_id = params.required_str("campaignEmailId")?;

    let mut body = JsonObject::new();
    let tokens: JsonObject = params
        .object("tokensUi")
        .and_then(|ui| ui.value("tokenValues"))
        .and_then(JsonValue::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| {
                    let key = entry.get("tokenKey")?.as_str().filter(|k| !k.is_empty())?;
                    let value = entry.get("tokenValue")?;
                    Some((key.to_string(), value.clone()))
                })
                .collect()
        })
        .unwrap_or_default();
    if !tokens.is_empty() {
        body.insert("tokens".into(), JsonValue::Object(tokens));
    }

    let attachments = params.optional_string_list("assetAttachments")?;
    if !attachments.is_empty() {
        body.insert("assetAttachments".into(), json!(attachments));
    }

    ctx.api
        .request(
            ApiRequest::new(
                Method::POST,
                format!("/emails/{email_id}/contact/{contact_id}/send"),
            )
            .with_body(JsonValue::Object(body)),
        )
        .await
}

async fn edit_points(ctx: &OperationContext<'_>, params: &Params<'_>) -> Result<JsonValue> {
    let id = params.required_str("contactId")?;
    let action = params.required_str("action")?;
    let points = params.required_str("points")?;
    let direction = if action == "add" { "plus" } else { "minus" };

    let mut body = JsonObject::new();
    for key in ["eventName", "actionName"] {
        if let Some(value) = params.optional_str(key)? {
            body.insert(key.into(), json!(value));
        }
    }

    let response = ctx
        .api
        .request(
            ApiRequest::new(
                Method::POST,
                format!("{CONTACTS_PATH}/{id}/points/{direction}/{points}"),
            )
            .with_body(JsonValue::Object(body)),
        )
        .await?;
    Ok(contact_or_response(response))
}

async fn edit_do_not_contact(
    ctx: &OperationContext<'_>,
    params: &Params<'_>,
) -> Result<JsonValue> {
    let id = params.required_str("contactId")?;
    let action = params.required_str("action")?;
    let channel = params.required_str("channel")?;
    let action = if action == "add" { "add" } else { "remove" };

    let mut body = JsonObject::new();
    body.insert(
        "reason".into(),
        params.value("reason").cloned().unwrap_or_else(|| json!(3)),
    );
    for key in ["channelId", "comments"] {
        if let Some(value) = params.optional_str(key)? {
            body.insert(key.into(), json!(value));
        }
    }

    let response = ctx
        .api
        .request(
            ApiRequest::new(
                Method::POST,
                format!("{CONTACTS_PATH}/{id}/dnc/{channel}/{action}"),
            )
            .with_body(JsonValue::Object(body)),
        )
        .await?;
    Ok(contact_or_response(response))
}

/// UTM option names and the body keys Mautic expects
const UTM_FIELDS: [(&str, &str); 11] = [
    ("utmSource", "utm_source"),
    ("utmMedium", "utm_medium"),
    ("utmCampaign", "utm_campaign"),
    ("utmContent", "utm_content"),
    ("utmTerm", "utm_term"),
    ("userAgent", "useragent"),
    ("url", "url"),
    ("referer", "referer"),
    ("query", "query"),
    ("remoteHost", "remotehost"),
    ("lastActive", "lastActive"),
];

async fn add_utm(ctx: &OperationContext<'_>, params: &Params<'_>) -> Result<JsonValue> {
    let id = params.required_str("contactId")?;
    let utm = params.optional_object("utmFields")?;

    let mut body = JsonObject::new();
    for (option, key) in UTM_FIELDS {
        if let Some(value) = utm.get(option).filter(|v| !v.is_null() && v.as_str() != Some("")) {
            body.insert(key.into(), value.clone());
        }
    }

    let response = ctx
        .api
        .request(
            ApiRequest::new(Method::POST, format!("{CONTACTS_PATH}/{id}/utm/add"))
                .with_body(JsonValue::Object(body)),
        )
        .await?;
    Ok(contact_or_response(response))
}

async fn remove_utm(ctx: &OperationContext<'_>, params: &Params<'_>) -> Result<JsonValue> {
    let id = params.required_str("contactId")?;
    let utm_id = params.required_str("utmId")?;
    let response = ctx
        .api
        .request(ApiRequest::new(
            Method::POST,
            format!("{CONTACTS_PATH}/{id}/utm/{utm_id}/remove"),
        ))
        .await?;
    Ok(contact_or_response(response))
}

async fn change_membership(
    ctx: &OperationContext<'_>,
    params: &Params<'_>,
    kind: &str,
    ids_param: &str,
    action: &str,
) -> Result<JsonValue> {
    let id = params.required_str("contactId")?;
    let ids = string_list(ids_param, params.required(ids_param)?)?;
    let mut body = JsonObject::new();
    body.insert(kind.to_string(), json!(ids));

    let response = ctx
        .api
        .request(
            ApiRequest::new(Method::POST, format!("{CONTACTS_PATH}/{id}/{kind}/{action}"))
                .with_body(JsonValue::Object(body)),
        )
        .await?;
    Ok(contact_or_response(response))
}

fn contact_or_response(response: JsonValue) -> JsonValue {
    match response.get("contact") {
        Some(contact) => contact.clone(),
        None => response,
    }
}

// ============================================================================
// Request Bodies
// ============================================================================

/// Top-level parameters and the contact fields they map to
const CONTACT_BODY_FIELDS: [(&str, &str); 6] = [
    ("email", "email"),
    ("firstName", "firstname"),
    ("lastName", "lastname"),
    ("company", "company"),
    ("position", "position"),
    ("title", "title"),
];

/// Simple additional fields copied when truthy
const ADDITIONAL_FIELDS: [(&str, &str); 8] = [
    ("company", "company"),
    ("position", "position"),
    ("ipAddress", "ipAddress"),
    ("lastActive", "lastActive"),
    ("owner", "owner"),
    ("perspective", "perspective"),
    ("points", "points"),
    ("preferredChannel", "preferred_channel"),
];

const ADDRESS_FIELDS: [(&str, &str); 6] = [
    ("address1", "address1"),
    ("address2", "address2"),
    ("city", "city"),
    ("state", "state"),
    ("country", "country"),
    ("zipCode", "zipcode"),
];

/// A body given as a JSON object or JSON string
fn json_body(params: &Params<'_>, name: &str) -> Result<JsonObject> {
    match params.optional_json(name) {
        Some(JsonValue::Object(map)) => Ok(map),
        Some(_) => Err(Error::invalid_param(name, "expected a JSON object")),
        None if params.value(name).is_some() => {
            Err(Error::invalid_param(name, "is not valid JSON"))
        }
        None => Err(Error::missing_param(name)),
    }
}

/// Add address, social, custom and other optional fields to a contact body
fn add_contact_fields(body: &mut JsonObject, fields: &JsonObject) {
    let view = Params::new(fields);

    if let Some(address) = view
        .object("addressUi")
        .and_then(|ui| ui.object("addressValues"))
    {
        for (from, to) in ADDRESS_FIELDS {
            if let Some(value) = address.value(from) {
                body.insert(to.into(), value.clone());
            }
        }
    }

    if let Some(entries) = view
        .object("socialMediaUi")
        .and_then(|ui| ui.value("socialMediaValues"))
        .and_then(JsonValue::as_array)
    {
        for entry in entries {
            if let Some(field) = entry.get("socialMediaField").and_then(JsonValue::as_str) {
                let value = entry.get("value").cloned().unwrap_or(JsonValue::Null);
                body.insert(format!("social_{field}"), value);
            }
        }
    }

    for (from, to) in ADDITIONAL_FIELDS {
        if let Some(value) = view.value(from).filter(|v| is_truthy(v)) {
            body.insert(to.into(), value.clone());
        }
    }

    if let Some(tags) = view.value("tags").filter(|v| is_truthy(v)) {
        body.insert("tags".into(), json!(normalize_tags(tags)));
    }

    if let Some(entries) = view
        .object("customFieldsUi")
        .and_then(|ui| ui.value("customFieldValues"))
        .and_then(JsonValue::as_array)
    {
        let mut custom = JsonObject::new();
        for entry in entries {
            let Some(field_id) = entry.get("fieldId") else {
                continue;
            };
            let key = match field_id {
                JsonValue::String(s) => s.clone(),
                other => other.to_string(),
            };
            custom.insert(key, entry.get("fieldValue").cloned().unwrap_or(JsonValue::Null));
        }
        merge_fields(body, &custom);
    }
}

fn is_truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(_) | JsonValue::Object(_) => true,
    }
}

/// Accept tags as a list, a comma-separated string, `[{tag}]` records or
/// an object holding such lists; duplicates are dropped
pub fn normalize_tags(input: &JsonValue) -> Vec<String> {
    fn tag_of(item: &JsonValue) -> Option<String> {
        match item {
            JsonValue::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            JsonValue::Object(map) => map.get("tag").and_then(tag_of),
            JsonValue::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    let mut tags: Vec<String> = match input {
        JsonValue::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
        JsonValue::Array(items) => items.iter().filter_map(tag_of).collect(),
        JsonValue::Object(map) => map
            .values()
            .filter_map(JsonValue::as_array)
            .flatten()
            .filter_map(tag_of)
            .collect(),
        _ => Vec::new(),
    };

    let mut seen = std::collections::HashSet::new();
    tags.retain(|t| seen.insert(t.clone()));
    tags
}

//! Company operations
//!
//! Listing, reading and deleting follow the standard layout. Create and
//! update translate the friendly field names into Mautic's `company*`
//! aliases.

use super::params::Params;
use super::resources::{merge_fields, COMPANY};
use super::types::OperationContext;
use crate::error::Result;
use crate::http::ApiRequest;
use crate::types::{JsonObject, JsonValue, Method};

/// Parameter names and the company field aliases they map to
const COMPANY_FIELDS: [(&str, &str); 9] = [
    ("name", "companyname"),
    ("companyEmail", "companyemail"),
    ("fax", "companyfax"),
    ("industry", "companyindustry"),
    ("numberOfEmployees", "companynumber_of_employees"),
    ("phone", "companyphone"),
    ("website", "companywebsite"),
    ("annualRevenue", "companyannual_revenue"),
    ("description", "companydescription"),
];

const ADDRESS_FIELDS: [(&str, &str); 6] = [
    ("address1", "companyaddress1"),
    ("address2", "companyaddress2"),
    ("city", "companycity"),
    ("state", "companystate"),
    ("country", "companycountry"),
    ("zipCode", "companyzipcode"),
];

/// Run a company operation
pub async fn execute(
    ctx: &OperationContext<'_>,
    operation: &str,
    params: &Params<'_>,
) -> Result<JsonValue> {
    match operation {
        "create" => {
            let name = params.required("name")?;
            let mut body = JsonObject::new();
            body.insert("companyname".into(), name.clone());
            body.extend(company_body(&params.optional_object("additionalFields")?));
            send(ctx, params, Method::POST, "/companies/new".to_string(), body).await
        }
        "update" => {
            let id = params.required_str("companyId")?;
            let body = company_body(&params.optional_object("updateFields")?);
            let method = if params.optional_bool("createIfNotFound", false)? {
                Method::PUT
            } else {
                Method::PATCH
            };
            send(ctx, params, method, format!("/companies/{id}/edit"), body).await
        }
        _ => COMPANY.execute(ctx, operation, params).await,
    }
}

async fn send(
    ctx: &OperationContext<'_>,
    params: &Params<'_>,
    method: Method,
    path: String,
    body: JsonObject,
) -> Result<JsonValue> {
    let response = ctx
        .api
        .request(ApiRequest::new(method, path).with_body(JsonValue::Object(body)))
        .await?;
    COMPANY.finish_single(params, COMPANY.single_item(response))
}

/// Translate friendly company fields into a request body
///
/// Known names are renamed, `addressUi` and `customFieldsUi` are expanded
/// and everything else is passed through as given.
pub fn company_body(fields: &JsonObject) -> JsonObject {
    let mut body = JsonObject::new();
    let mut rest = fields.clone();

    for (from, to) in COMPANY_FIELDS {
        if let Some(value) = rest.remove(from) {
            if !value.is_null() {
                body.insert(to.into(), value);
            }
        }
    }

    if let Some(JsonValue::Object(ui)) = rest.remove("addressUi") {
        if let Some(JsonValue::Object(address)) = ui.get("addressValues") {
            for (from, to) in ADDRESS_FIELDS {
                if let Some(value) = address.get(from).filter(|v| !v.is_null()) {
                    body.insert(to.into(), value.clone());
                }
            }
        }
    }

    if let Some(JsonValue::Object(ui)) = rest.remove("customFieldsUi") {
        for entry in ui
            .get("customFieldValues")
            .and_then(JsonValue::as_array)
            .into_iter()
            .flatten()
        {
            let key = match entry.get("fieldId") {
                Some(JsonValue::String(s)) if !s.is_empty() => s.clone(),
                Some(JsonValue::Number(n)) => n.to_string(),
                _ => continue,
            };
            body.insert(key, entry.get("fieldValue").cloned().unwrap_or(JsonValue::Null));
        }
    }

    merge_fields(&mut body, &rest);
    body
}

//! Table-driven CRUD for the resources that share Mautic's standard layout
//!
//! Each of these lives under `/{plural}` with `/new`, `/{id}`, `/{id}/edit`
//! and `/{id}/delete` endpoints and wraps single records under a fixed key.

use super::listing::{apply_default_order, build_query_from_options, fetch_list, ListMode};
use super::params::Params;
use super::postprocess::{convert_numeric_strings, insert_present, simplify};
use super::types::{OperationContext, Resource};
use crate::error::{Error, Result};
use crate::http::ApiRequest;
use crate::types::{JsonObject, JsonValue, Method};
use serde_json::json;
use tracing::debug;

/// How a resource maps onto the standard endpoints
#[derive(Debug, Clone, Copy)]
pub struct ResourceSpec {
    /// Resource served by this spec
    pub resource: Resource,
    /// Collection path, e.g. `/campaigns`
    pub base_path: &'static str,
    /// Parameter that extends the base path (`/fields/{fieldObject}`)
    pub scope_param: Option<&'static str>,
    /// Parameter carrying the record id
    pub id_param: &'static str,
    /// Response key of a single record
    pub item_key: &'static str,
    /// Response key of a collection
    pub collection_key: &'static str,
    /// Parameters required on create
    pub create_required: &'static [&'static str],
    /// Top-level parameters copied into create and update bodies when set
    pub body_optional: &'static [&'static str],
    /// Values used on create when the caller gives none
    pub create_defaults: &'static [(&'static str, &'static str)],
    /// Body fields that may arrive as JSON strings
    pub json_fields: &'static [&'static str],
    /// Sort listings by `id asc` unless told otherwise
    pub default_order: bool,
    /// Convert numeric strings in the output
    pub convert_numbers: bool,
    /// Default of the `simple` flag; `None` disables flattening
    pub simple_default: Option<bool>,
    /// Page size when `limit` is not given
    pub default_limit: usize,
}

const BASE: ResourceSpec = ResourceSpec {
    resource: Resource::Campaign,
    base_path: "",
    scope_param: None,
    id_param: "",
    item_key: "",
    collection_key: "",
    create_required: &["name"],
    body_optional: &[],
    create_defaults: &[],
    json_fields: &[],
    default_order: true,
    convert_numbers: false,
    simple_default: None,
    default_limit: 30,
};

pub const CAMPAIGN: ResourceSpec = ResourceSpec {
    resource: Resource::Campaign,
    base_path: "/campaigns",
    id_param: "campaignId",
    item_key: "campaign",
    collection_key: "campaigns",
    body_optional: &["description", "isPublished"],
    ..BASE
};

pub const COMPANY: ResourceSpec = ResourceSpec {
    resource: Resource::Company,
    base_path: "/companies",
    id_param: "companyId",
    item_key: "company",
    collection_key: "companies",
    simple_default: Some(false),
    ..BASE
};

pub const CATEGORY: ResourceSpec = ResourceSpec {
    resource: Resource::Category,
    base_path: "/categories",
    id_param: "categoryId",
    item_key: "category",
    collection_key: "categories",
    create_required: &["title", "bundle"],
    body_optional: &["title", "bundle", "description", "color"],
    convert_numbers: true,
    ..BASE
};

pub const EMAIL: ResourceSpec = ResourceSpec {
    resource: Resource::Email,
    base_path: "/emails",
    id_param: "emailId",
    item_key: "email",
    collection_key: "emails",
    body_optional: &["name", "subject", "customHtml", "emailType"],
    default_order: false,
    convert_numbers: true,
    default_limit: 50,
    ..BASE
};

pub const NOTIFICATION: ResourceSpec = ResourceSpec {
    resource: Resource::Notification,
    base_path: "/notifications",
    id_param: "notificationId",
    item_key: "notification",
    collection_key: "notifications",
    body_optional: &["name", "heading", "message", "url"],
    default_order: false,
    ..BASE
};

pub const SEGMENT: ResourceSpec = ResourceSpec {
    resource: Resource::Segment,
    base_path: "/segments",
    id_param: "segmentId",
    item_key: "list",
    collection_key: "lists",
    body_optional: &["name", "alias", "description", "isPublished", "isGlobal"],
    default_order: false,
    ..BASE
};

pub const TAG: ResourceSpec = ResourceSpec {
    resource: Resource::Tag,
    base_path: "/tags",
    id_param: "tagId",
    item_key: "tag",
    collection_key: "tags",
    create_required: &["tag"],
    convert_numbers: true,
    ..BASE
};

pub const FIELD: ResourceSpec = ResourceSpec {
    resource: Resource::Field,
    base_path: "/fields",
    scope_param: Some("fieldObject"),
    id_param: "fieldId",
    item_key: "field",
    collection_key: "fields",
    create_required: &["label", "type"],
    body_optional: &[
        "label",
        "type",
        "alias",
        "group",
        "defaultValue",
        "isRequired",
        "isPubliclyUpdatable",
        "isUniqueIdentifier",
        "properties",
    ],
    create_defaults: &[("group", "core")],
    default_order: false,
    convert_numbers: true,
    default_limit: 50,
    ..BASE
};

pub const USER: ResourceSpec = ResourceSpec {
    resource: Resource::User,
    base_path: "/users",
    id_param: "userId",
    item_key: "user",
    collection_key: "users",
    create_required: &["username", "email"],
    body_optional: &["username", "email", "firstName", "lastName", "role", "plainPassword"],
    convert_numbers: true,
    simple_default: Some(true),
    ..BASE
};

pub const ROLE: ResourceSpec = ResourceSpec {
    resource: Resource::Role,
    base_path: "/roles",
    id_param: "roleId",
    item_key: "role",
    collection_key: "roles",
    body_optional: &["name", "description", "isAdmin", "isPublished", "rawPermissions"],
    json_fields: &["rawPermissions"],
    convert_numbers: true,
    simple_default: Some(true),
    ..BASE
};

pub const STAGE: ResourceSpec = ResourceSpec {
    resource: Resource::Stage,
    base_path: "/stages",
    id_param: "stageId",
    item_key: "stage",
    collection_key: "stages",
    body_optional: &["name", "description", "weight", "isPublished"],
    ..BASE
};

/// Look up the standard layout of a resource
pub fn spec_for(resource: Resource) -> Option<&'static ResourceSpec> {
    let spec = match resource {
        Resource::Campaign => &CAMPAIGN,
        Resource::Category => &CATEGORY,
        Resource::Email => &EMAIL,
        Resource::Notification => &NOTIFICATION,
        Resource::Segment => &SEGMENT,
        Resource::Tag => &TAG,
        Resource::Field => &FIELD,
        Resource::User => &USER,
        Resource::Role => &ROLE,
        Resource::Stage => &STAGE,
        _ => return None,
    };
    Some(spec)
}

impl ResourceSpec {
    /// Collection path, resolving the scope parameter if any
    pub fn collection_path(&self, params: &Params<'_>) -> Result<String> {
        match self.scope_param {
            Some(scope) => Ok(format!("{}/{}", self.base_path, params.required_str(scope)?)),
            None => Ok(self.base_path.to_string()),
        }
    }

    fn record_path(&self, params: &Params<'_>) -> Result<String> {
        let id = params.required_str(self.id_param)?;
        Ok(format!("{}/{id}", self.collection_path(params)?))
    }

    /// Run one of the standard operations
    pub async fn execute(
        &self,
        ctx: &OperationContext<'_>,
        operation: &str,
        params: &Params<'_>,
    ) -> Result<JsonValue> {
        match operation {
            "get" => self.get(ctx, params).await,
            "getAll" => self.get_all(ctx, params).await,
            "create" => self.create(ctx, params).await,
            "update" => self.update(ctx, params).await,
            "delete" => self.delete(ctx, params).await,
            other => Err(Error::unsupported_operation(
                self.resource.display_name(),
                other,
            )),
        }
    }

    async fn get(&self, ctx: &OperationContext<'_>, params: &Params<'_>) -> Result<JsonValue> {
        let path = self.record_path(params)?;
        let body = ctx.api.request(ApiRequest::get(path)).await?;
        self.finish_single(params, self.single_item(body))
    }

    async fn get_all(&self, ctx: &OperationContext<'_>, params: &Params<'_>) -> Result<JsonValue> {
        let path = self.collection_path(params)?;
        let options = params.optional_object("options")?;
        let mut query = build_query_from_options(&options);
        if self.default_order {
            apply_default_order(&mut query);
        }

        let mode = ListMode::from_params(params, self.default_limit)?;
        let mut items = fetch_list(ctx.api, &path, self.collection_key, query, mode).await?;
        debug!(resource = %self.resource, count = items.len(), "Listed records");

        if self.simple(params)? {
            items = simplify(items);
        }
        let value = JsonValue::Array(items);
        Ok(if self.convert_numbers {
            convert_numeric_strings(value)
        } else {
            value
        })
    }

    async fn create(&self, ctx: &OperationContext<'_>, params: &Params<'_>) -> Result<JsonValue> {
        let path = format!("{}/new", self.collection_path(params)?);
        let mut body = JsonObject::new();
        for name in self.create_required {
            body.insert((*name).to_string(), params.required(name)?.clone());
        }
        self.copy_optional(params, &mut body);
        for (key, value) in self.create_defaults {
            body.entry((*key).to_string()).or_insert_with(|| json!(value));
        }
        merge_fields(&mut body, &params.optional_object("additionalFields")?);
        self.normalize_body(&mut body);

        let response = ctx
            .api
            .request(ApiRequest::new(Method::POST, path).with_body(JsonValue::Object(body)))
            .await?;
        self.finish_single(params, self.single_item(response))
    }

    async fn update(&self, ctx: &OperationContext<'_>, params: &Params<'_>) -> Result<JsonValue> {
        let path = format!("{}/edit", self.record_path(params)?);
        let mut body = JsonObject::new();
        self.copy_optional(params, &mut body);
        merge_fields(&mut body, &params.optional_object("updateFields")?);
        merge_fields(&mut body, &params.optional_object("additionalFields")?);
        self.normalize_body(&mut body);

        let method = if params.optional_bool("createIfNotFound", false)? {
            Method::PUT
        } else {
            Method::PATCH
        };
        let response = ctx
            .api
            .request(ApiRequest::new(method, path).with_body(JsonValue::Object(body)))
            .await?;
        self.finish_single(params, self.single_item(response))
    }

    async fn delete(&self, ctx: &OperationContext<'_>, params: &Params<'_>) -> Result<JsonValue> {
        let path = format!("{}/delete", self.record_path(params)?);
        let response = ctx
            .api
            .request(ApiRequest::new(Method::DELETE, path))
            .await?;
        self.finish_single(params, self.single_item(response))
    }

    fn copy_optional(&self, params: &Params<'_>, body: &mut JsonObject) {
        for name in self.body_optional {
            insert_present(body, name, params.value(name));
        }
    }

    fn normalize_body(&self, body: &mut JsonObject) {
        for field in self.json_fields {
            let raw = match body.get(*field) {
                Some(JsonValue::String(raw)) => raw.clone(),
                _ => continue,
            };
            match serde_json::from_str::<JsonValue>(&raw) {
                Ok(parsed) => {
                    body.insert((*field).to_string(), parsed);
                }
                Err(_) => {
                    body.remove(*field);
                }
            }
        }

        // Select options may be given as `{ list: { items: [...] } }`
        let list = body
            .get("properties")
            .and_then(|p| p.pointer("/list/items"))
            .and_then(JsonValue::as_array)
            .map(|items| {
                items
                    .iter()
                    .map(|item| json!({ "label": item.get("label"), "value": item.get("value") }))
                    .collect::<Vec<_>>()
            });
        if let Some(list) = list {
            body.insert("properties".to_string(), json!({ "list": list }));
        }
    }

    /// Pick the record out of a single-item response
    ///
    /// Responses without the record key are returned whole; an empty or
    /// `null` record becomes a success marker.
    pub(crate) fn single_item(&self, response: JsonValue) -> JsonValue {
        match response {
            JsonValue::Null => json!({ "success": true }),
            JsonValue::Object(mut map) => match map.remove(self.item_key) {
                Some(JsonValue::Null) => json!({ "success": true }),
                Some(item) => item,
                None => JsonValue::Object(map),
            },
            other => other,
        }
    }

    pub(crate) fn finish_single(&self, params: &Params<'_>, item: JsonValue) -> Result<JsonValue> {
        let item = if self.simple(params)? {
            super::postprocess::fields_all(&item).cloned().unwrap_or(item)
        } else {
            item
        };
        Ok(if self.convert_numbers {
            convert_numeric_strings(item)
        } else {
            item
        })
    }

    fn simple(&self, params: &Params<'_>) -> Result<bool> {
        match self.simple_default {
            Some(default) => params.optional_bool("simple", default),
            None => Ok(false),
        }
    }
}

/// Merge caller-supplied fields into a body, skipping `null` values
pub(crate) fn merge_fields(body: &mut JsonObject, fields: &JsonObject) {
    for (key, value) in fields {
        if !value.is_null() {
            body.insert(key.clone(), value.clone());
        }
    }
}

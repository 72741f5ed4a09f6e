//! Node executor and option loaders
//!
//! [`MauticNode`] runs a batch of operation requests one after another
//! against a single instance. The `list_*` helpers feed option pickers with
//! `(name, value)` pairs read through the paginator.

use crate::error::{Error, Result};
use crate::http::{ApiRequest, MauticApi};
use crate::operations::{execute_operation, OperationContext, OperationRequest};
use crate::pagination::{paginate, EndpointFetcher};
use crate::query::QueryParams;
use crate::types::{JsonValue, MauticVersion};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

/// A labelled choice for a picker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionEntry {
    pub name: String,
    pub value: String,
}

impl OptionEntry {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Which emails to offer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailKind {
    /// Segment (list) emails
    Segment,
    /// Campaign (template) emails
    Campaign,
}

impl EmailKind {
    fn email_type(self) -> &'static str {
        match self {
            EmailKind::Segment => "list",
            EmailKind::Campaign => "template",
        }
    }
}

/// Contact fields that are not part of `/fields/contact`
const SYSTEM_CONTACT_FIELDS: [(&str, &str); 4] = [
    ("Date Added", "date_added"),
    ("Date Modified", "date_modified"),
    ("ID", "id"),
    ("Owner ID", "owner_id"),
];

// ============================================================================
// Node
// ============================================================================

/// Runs operation requests against one Mautic instance
pub struct MauticNode {
    api: Arc<dyn MauticApi>,
    version: MauticVersion,
    continue_on_fail: bool,
}

impl MauticNode {
    /// Create a node over an API client
    pub fn new(api: Arc<dyn MauticApi>) -> Self {
        Self {
            api,
            version: MauticVersion::default(),
            continue_on_fail: false,
        }
    }

    /// Set the remote version
    #[must_use]
    pub fn with_version(mut self, version: MauticVersion) -> Self {
        self.version = version;
        self
    }

    /// Keep going after a failed item, reporting it as `{"error": ...}`
    #[must_use]
    pub fn with_continue_on_fail(mut self, continue_on_fail: bool) -> Self {
        self.continue_on_fail = continue_on_fail;
        self
    }

    fn context(&self) -> OperationContext<'_> {
        OperationContext::new(self.api.as_ref()).with_version(self.version)
    }

    /// Run every request in order and collect their output records
    pub async fn execute(&self, items: &[OperationRequest]) -> Result<Vec<JsonValue>> {
        let ctx = self.context();
        let mut output = Vec::new();

        for (index, item) in items.iter().enumerate() {
            info!(
                index,
                resource = %item.resource,
                operation = %item.operation,
                "Executing operation"
            );
            match execute_operation(&ctx, item).await {
                Ok(records) => {
                    info!(index, records = records.len(), "Operation complete");
                    output.extend(records);
                }
                Err(e) if self.continue_on_fail => {
                    warn!(index, error = %e, "Operation failed, continuing");
                    output.push(json!({ "error": e.to_string() }));
                }
                Err(e) => return Err(e),
            }
        }

        Ok(output)
    }

    /// Check that the instance answers with the configured credentials
    pub async fn check(&self) -> Result<JsonValue> {
        self.api.request(ApiRequest::get("/users/self")).await
    }

    // ========================================================================
    // Option Loaders
    // ========================================================================

    async fn collect(&self, endpoint: &str, collection_key: &str) -> Result<Vec<JsonValue>> {
        let fetcher = EndpointFetcher::get(self.api.as_ref(), endpoint);
        paginate(&fetcher, collection_key, &QueryParams::new(), None).await
    }

    pub async fn list_tags(&self) -> Result<Vec<OptionEntry>> {
        let tags = self.collect("/tags", "tags").await?;
        Ok(entries(&tags, "tag", "tag"))
    }

    pub async fn list_stages(&self) -> Result<Vec<OptionEntry>> {
        let stages = self.collect("/stages", "stages").await?;
        Ok(entries(&stages, "name", "id"))
    }

    pub async fn list_segments(&self) -> Result<Vec<OptionEntry>> {
        let segments = self.collect("/segments", "lists").await?;
        Ok(entries(&segments, "name", "id"))
    }

    pub async fn list_campaigns(&self) -> Result<Vec<OptionEntry>> {
        let campaigns = self.collect("/campaigns", "campaigns").await?;
        Ok(entries(&campaigns, "name", "id"))
    }

    /// Emails of one kind
    pub async fn list_emails(&self, kind: EmailKind) -> Result<Vec<OptionEntry>> {
        let emails = self.collect("/emails", "emails").await?;
        let matching: Vec<JsonValue> = emails
            .into_iter()
            .filter(|e| e.get("emailType").and_then(JsonValue::as_str) == Some(kind.email_type()))
            .collect();
        Ok(entries(&matching, "name", "id"))
    }

    pub async fn list_company_fields(&self) -> Result<Vec<OptionEntry>> {
        let fields = self.collect("/fields/company", "fields").await?;
        Ok(entries(&fields, "label", "alias"))
    }

    /// System fields followed by the instance's contact fields
    pub async fn list_contact_fields(&self) -> Result<Vec<OptionEntry>> {
        let fields = self.collect("/fields/contact", "fields").await?;
        let mut options: Vec<OptionEntry> = SYSTEM_CONTACT_FIELDS
            .iter()
            .map(|(name, value)| OptionEntry::new(*name, *value))
            .collect();
        options.extend(entries(&fields, "label", "alias"));
        Ok(options)
    }

    /// Choices of the `companyindustry` select field
    pub async fn list_industries(&self) -> Result<Vec<OptionEntry>> {
        let fields = self.collect("/fields/company", "fields").await?;
        let industry = fields
            .iter()
            .find(|f| f.get("alias").and_then(JsonValue::as_str) == Some("companyindustry"))
            .ok_or_else(|| Error::operation("Company field 'companyindustry' was not found."))?;

        let choices = industry
            .pointer("/properties/list")
            .and_then(JsonValue::as_array)
            .cloned()
            .unwrap_or_default();
        Ok(entries(&choices, "label", "value"))
    }
}

/// Build options from records, skipping those missing either key
fn entries(records: &[JsonValue], name_key: &str, value_key: &str) -> Vec<OptionEntry> {
    records
        .iter()
        .filter_map(|record| {
            let name = text(record.get(name_key)?)?;
            let value = text(record.get(value_key)?)?;
            Some(OptionEntry { name, value })
        })
        .collect()
}

fn text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod node_tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    /// Serves fixed bodies per endpoint
    struct StaticApi {
        bodies: Vec<(&'static str, JsonValue)>,
        calls: Mutex<Vec<String>>,
    }

    impl StaticApi {
        fn new(bodies: Vec<(&'static str, JsonValue)>) -> Arc<Self> {
            Arc::new(Self {
                bodies,
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl MauticApi for StaticApi {
        async fn request(&self, request: ApiRequest) -> Result<JsonValue> {
            self.calls.lock().unwrap().push(request.endpoint.clone());
            self.bodies
                .iter()
                .find(|(endpoint, _)| *endpoint == request.endpoint)
                .map(|(_, body)| body.clone())
                .ok_or_else(|| Error::api_status(404, "Not Found", None))
        }
    }

    #[tokio::test]
    async fn test_execute_stops_on_first_error() {
        let api = StaticApi::new(vec![("/stages/1", json!({ "stage": { "id": 1 } }))]);
        let node = MauticNode::new(api.clone());
        let items = vec![
            OperationRequest::new("stage", "get").with_param("stageId", 2),
            OperationRequest::new("stage", "get").with_param("stageId", 1),
        ];

        let err = node.execute(&items).await.unwrap_err();
        assert_eq!(err.to_string(), "Stage not found during get operation.");
        assert_eq!(api.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_execute_continue_on_fail_records_errors() {
        let api = StaticApi::new(vec![("/stages/1", json!({ "stage": { "id": 1 } }))]);
        let node = MauticNode::new(api).with_continue_on_fail(true);
        let items = vec![
            OperationRequest::new("widget", "get"),
            OperationRequest::new("stage", "get").with_param("stageId", 1),
        ];

        let out = node.execute(&items).await.unwrap();
        assert_eq!(
            out,
            vec![
                json!({ "error": "Resource 'widget' is not supported." }),
                json!({ "id": 1 }),
            ]
        );
    }

    #[tokio::test]
    async fn test_list_emails_filters_by_kind() {
        let api = StaticApi::new(vec![(
            "/emails",
            json!({ "emails": [
                { "id": 1, "name": "Newsletter", "emailType": "list" },
                { "id": 2, "name": "Welcome", "emailType": "template" }
            ] }),
        )]);
        let node = MauticNode::new(api);

        assert_eq!(
            node.list_emails(EmailKind::Campaign).await.unwrap(),
            vec![OptionEntry::new("Welcome", "2")]
        );
    }

    #[tokio::test]
    async fn test_list_contact_fields_prepends_system_fields() {
        let api = StaticApi::new(vec![(
            "/fields/contact",
            json!({ "fields": [{ "label": "Email", "alias": "email" }] }),
        )]);
        let options = MauticNode::new(api).list_contact_fields().await.unwrap();

        assert_eq!(options.len(), 5);
        assert_eq!(options[0], OptionEntry::new("Date Added", "date_added"));
        assert_eq!(options[4], OptionEntry::new("Email", "email"));
    }

    #[tokio::test]
    async fn test_list_industries_reads_select_choices() {
        let api = StaticApi::new(vec![(
            "/fields/company",
            json!({ "fields": [
                { "alias": "companyname", "label": "Name" },
                { "alias": "companyindustry", "label": "Industry", "properties": { "list": [
                    { "label": "Retail", "value": "retail" },
                    { "label": "Banking", "value": "banking" }
                ] } }
            ] }),
        )]);
        let options = MauticNode::new(api).list_industries().await.unwrap();

        assert_eq!(
            options,
            vec![
                OptionEntry::new("Retail", "retail"),
                OptionEntry::new("Banking", "banking"),
            ]
        );
    }
}

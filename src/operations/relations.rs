//! Membership links between contacts and segments, campaigns and companies,
//! plus segment email sends

use super::params::Params;
use super::types::{OperationContext, Resource};
use crate::error::{Error, Result};
use crate::http::ApiRequest;
use crate::types::{JsonValue, Method};
use serde_json::json;

/// A container a contact can be added to or removed from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    Segment,
    Campaign,
    Company,
}

impl Membership {
    /// Membership managed by a relationship resource
    pub fn for_resource(resource: Resource) -> Option<Self> {
        match resource {
            Resource::ContactSegment => Some(Self::Segment),
            Resource::CampaignContact => Some(Self::Campaign),
            Resource::CompanyContact => Some(Self::Company),
            _ => None,
        }
    }

    fn base_path(self) -> &'static str {
        match self {
            Membership::Segment => "/segments",
            Membership::Campaign => "/campaigns",
            Membership::Company => "/companies",
        }
    }

    fn id_param(self) -> &'static str {
        match self {
            Membership::Segment => "segmentId",
            Membership::Campaign => "campaignId",
            Membership::Company => "companyId",
        }
    }

    /// `{base}/{parent}/contact/{contact}/{action}`
    pub fn contact_path(self, parent_id: &str, contact_id: &str, action: &str) -> String {
        format!(
            "{}/{parent_id}/contact/{contact_id}/{action}",
            self.base_path()
        )
    }
}

/// Add or remove one contact
pub async fn execute_membership(
    ctx: &OperationContext<'_>,
    membership: Membership,
    resource: Resource,
    operation: &str,
    params: &Params<'_>,
) -> Result<JsonValue> {
    let action = match operation {
        "add" | "addContact" => "add",
        "remove" | "removeContact" => "remove",
        other => {
            return Err(Error::unsupported_operation(
                resource.display_name(),
                other,
            ))
        }
    };

    let contact_id = params.required_str("contactId")?;
    let parent_id = params.required_str(membership.id_param())?;
    ctx.api
        .request(ApiRequest::new(
            Method::POST,
            membership.contact_path(&parent_id, &contact_id, action),
        ))
        .await
}

/// Add several contacts to a segment in one request
pub async fn add_contacts_to_segment(
    ctx: &OperationContext<'_>,
    params: &Params<'_>,
) -> Result<JsonValue> {
    let segment_id = params.required_str("segmentId")?;
    let ids = params.optional_string_list("contactIds")?;
    if ids.is_empty() {
        return Err(Error::missing_param("contactIds"));
    }

    ctx.api
        .request(
            ApiRequest::new(Method::POST, format!("/segments/{segment_id}/contacts/add"))
                .with_body(json!({ "ids": ids })),
        )
        .await
}

/// Send a segment (list) email to its recipients
pub async fn send_segment_email(
    ctx: &OperationContext<'_>,
    operation: &str,
    params: &Params<'_>,
) -> Result<JsonValue> {
    if operation != "send" {
        return Err(Error::unsupported_operation(
            Resource::SegmentEmail.display_name(),
            operation,
        ));
    }

    let email_id = params.required_str("segmentEmailId")?;
    ctx.api
        .request(ApiRequest::new(Method::POST, format!("/emails/{email_id}/send")))
        .await
}

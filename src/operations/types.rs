//! Operation request types

use crate::error::{Error, Result};
use crate::http::MauticApi;
use crate::types::{JsonObject, MauticVersion};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One unit of work: a resource, an operation on it, and its parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationRequest {
    /// Resource name, e.g. `contact`
    pub resource: String,
    /// Operation name, e.g. `getAll`
    pub operation: String,
    /// Operation parameters
    #[serde(default)]
    pub params: JsonObject,
}

impl OperationRequest {
    /// Create a request without parameters
    pub fn new(resource: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            operation: operation.into(),
            params: JsonObject::new(),
        }
    }

    /// Add a parameter
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Replace all parameters
    #[must_use]
    pub fn with_params(mut self, params: JsonObject) -> Self {
        self.params = params;
        self
    }
}

/// What handlers need to reach the instance
#[derive(Clone, Copy)]
pub struct OperationContext<'a> {
    /// Request seam
    pub api: &'a dyn MauticApi,
    /// Remote major version
    pub version: MauticVersion,
}

impl<'a> OperationContext<'a> {
    /// Context for a legacy (v6) instance
    pub fn new(api: &'a dyn MauticApi) -> Self {
        Self {
            api,
            version: MauticVersion::default(),
        }
    }

    /// Set the remote version
    #[must_use]
    pub fn with_version(mut self, version: MauticVersion) -> Self {
        self.version = version;
        self
    }
}

impl std::fmt::Debug for OperationContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationContext")
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Resources
// ============================================================================

/// Every resource the connector can operate on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Contact,
    Company,
    Campaign,
    Category,
    Email,
    Notification,
    Segment,
    Tag,
    Field,
    User,
    Role,
    Stage,
    SegmentEmail,
    ContactSegment,
    CampaignContact,
    CompanyContact,
    Stats,
}

impl Resource {
    /// All resources, in dispatch order
    pub const ALL: [Resource; 17] = [
        Resource::Contact,
        Resource::Company,
        Resource::Campaign,
        Resource::Category,
        Resource::Email,
        Resource::Notification,
        Resource::Segment,
        Resource::Tag,
        Resource::Field,
        Resource::User,
        Resource::Role,
        Resource::Stage,
        Resource::SegmentEmail,
        Resource::ContactSegment,
        Resource::CampaignContact,
        Resource::CompanyContact,
        Resource::Stats,
    ];

    /// Wire name used in operation requests
    pub fn as_str(self) -> &'static str {
        match self {
            Resource::Contact => "contact",
            Resource::Company => "company",
            Resource::Campaign => "campaign",
            Resource::Category => "category",
            Resource::Email => "email",
            Resource::Notification => "notification",
            Resource::Segment => "segment",
            Resource::Tag => "tag",
            Resource::Field => "field",
            Resource::User => "user",
            Resource::Role => "role",
            Resource::Stage => "stage",
            Resource::SegmentEmail => "segmentEmail",
            Resource::ContactSegment => "contactSegment",
            Resource::CampaignContact => "campaignContact",
            Resource::CompanyContact => "companyContact",
            Resource::Stats => "stats",
        }
    }

    /// Name used in user-facing messages
    pub fn display_name(self) -> &'static str {
        match self {
            Resource::Contact => "Contact",
            Resource::Company => "Company",
            Resource::Campaign => "Campaign",
            Resource::Category => "Category",
            Resource::Email | Resource::SegmentEmail => "Email",
            Resource::Notification => "Notification",
            Resource::Segment => "Segment",
            Resource::Tag => "Tag",
            Resource::Field => "Field",
            Resource::User => "User",
            Resource::Role => "Role",
            Resource::Stage => "Stage",
            Resource::ContactSegment => "Contact Segment",
            Resource::CampaignContact => "Campaign Contact",
            Resource::CompanyContact => "Company Contact",
            Resource::Stats => "Stats",
        }
    }
}

impl FromStr for Resource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Resource::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| Error::UnsupportedResource {
                resource: s.to_string(),
            })
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Operation handlers
//!
//! Each [`OperationRequest`] names a resource, an operation and a bag of
//! parameters. [`execute_operation`] routes it to the matching handler and
//! returns the records it produced:
//!
//! ```text
//! OperationRequest -> Resource -> handler -> JSON -> records
//! ```
//!
//! Handlers talk to the instance only through [`MauticApi`](crate::http::MauticApi),
//! so every operation can be exercised against a scripted fake.

mod campaign;
mod company;
mod contact;
mod listing;
mod params;
mod postprocess;
mod relations;
mod resources;
mod stats;
mod tag;
mod types;


pub use company::company_body;
pub use contact::{contact_list_query, normalize_tags, DncFilter};
pub use listing::{build_query_from_options, ListMode, DEFAULT_LIST_LIMIT};
pub use params::Params;
pub use postprocess::{
    convert_numeric_strings, process_contact_fields, simplify, snake_case, wrap_single_item,
};
pub use relations::Membership;
pub use resources::{spec_for, ResourceSpec};
pub use stats::STATS_PAGE_SIZE;
pub use tag::{normalise_tag, normalise_tag_collection, V2_TAGS_PATH};
pub use types::{OperationContext, OperationRequest, Resource};

use crate::error::{Error, Result};
use crate::types::JsonValue;
use tracing::debug;

/// Run one operation and return its output records
///
/// Failures are rewritten with [`map_operation_error`].
pub async fn execute_operation(
    ctx: &OperationContext<'_>,
    request: &OperationRequest,
) -> Result<Vec<JsonValue>> {
    let resource: Resource = request.resource.parse()?;
    let operation = request.operation.as_str();
    let params = Params::new(&request.params);
    debug!(%resource, operation, "Dispatching operation");

    dispatch(ctx, resource, operation, &params)
        .await
        .map(wrap_single_item)
        .map_err(|e| map_operation_error(e, operation, resource))
}

async fn dispatch(
    ctx: &OperationContext<'_>,
    resource: Resource,
    operation: &str,
    params: &Params<'_>,
) -> Result<JsonValue> {
    match resource {
        Resource::Contact => contact::execute(ctx, operation, params).await,
        Resource::Company => company::execute(ctx, operation, params).await,
        Resource::Campaign => campaign::execute(ctx, operation, params).await,
        Resource::Tag => tag::execute(ctx, operation, params).await,
        Resource::Stats => stats::execute(ctx, operation, params).await,
        Resource::SegmentEmail => relations::send_segment_email(ctx, operation, params).await,
        Resource::Segment => match operation {
            "addContact" | "removeContact" => {
                relations::execute_membership(ctx, Membership::Segment, resource, operation, params)
                    .await
            }
            "addContacts" => relations::add_contacts_to_segment(ctx, params).await,
            _ => resources::SEGMENT.execute(ctx, operation, params).await,
        },
        Resource::ContactSegment | Resource::CampaignContact | Resource::CompanyContact => {
            match Membership::for_resource(resource) {
                Some(membership) => {
                    relations::execute_membership(ctx, membership, resource, operation, params)
                        .await
                }
                None => Err(Error::UnsupportedResource {
                    resource: resource.to_string(),
                }),
            }
        }
        other => match spec_for(other) {
            Some(spec) => spec.execute(ctx, operation, params).await,
            None => Err(Error::UnsupportedResource {
                resource: other.to_string(),
            }),
        },
    }
}

/// Turn a failure into the message shown to users
///
/// API errors with status 404, 403 or 400 get a resource-specific message,
/// other API errors pass through. Unsupported resources and operations are
/// kept as they are; anything else is prefixed with what was being done.
pub fn map_operation_error(error: Error, operation: &str, resource: Resource) -> Error {
    let name = resource.display_name();
    match error.http_code() {
        Some(404) => {
            return Error::operation(format!("{name} not found during {operation} operation."))
        }
        Some(403) => {
            return Error::operation(format!(
                "Permission denied for {operation} {name}. Please check your API credentials."
            ))
        }
        Some(400) => {
            return Error::operation(format!(
                "Invalid data provided for {operation} {name}. Please check your input parameters."
            ))
        }
        _ => {}
    }

    match error {
        e @ (Error::ApiRequest { .. }
        | Error::UnsupportedResource { .. }
        | Error::UnsupportedOperation { .. }) => e,
        other => Error::operation(format!("Failed to {operation} {name}: {other}")),
    }
}

//! Integration tests using mock HTTP server
//!
//! Tests the full end-to-end flow: configuration → operation request →
//! HTTP requests against `/api` → output records

use mautic_connector::auth::AuthConfig;
use mautic_connector::filter::{compile_where, FilterNode};
use mautic_connector::pagination::{paginate, EndpointFetcher};
use mautic_connector::query::QueryParams;
use mautic_connector::{
    ConnectionConfig, MauticApi, MauticClient, MauticNode, MauticVersion, OperationRequest,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn node_for(server: &MockServer) -> MauticNode {
    let config = ConnectionConfig::new(server.uri(), AuthConfig::basic("admin", "secret"));
    let client = config.client().unwrap();
    MauticNode::new(Arc::new(client))
}

fn contacts_page(ids: std::ops::Range<u64>) -> Value {
    let contacts: serde_json::Map<String, Value> = ids
        .map(|id| {
            (
                id.to_string(),
                json!({ "id": id, "fields": { "all": { "id": id.to_string(), "email": format!("c{id}@example.com") } } }),
            )
        })
        .collect();
    json!({ "total": "45", "contacts": contacts })
}

// ============================================================================
// Pagination
// ============================================================================

#[tokio::test]
async fn test_contacts_return_all_pages_until_short_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/contacts"))
        .and(query_param("start", "0"))
        .and(query_param("limit", "30"))
        .respond_with(ResponseTemplate::new(200).set_body_json(contacts_page(1..31)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/contacts"))
        .and(query_param("start", "30"))
        .respond_with(ResponseTemplate::new(200).set_body_json(contacts_page(31..46)))
        .expect(1)
        .mount(&server)
        .await;

    let request = OperationRequest::new("contact", "getAll").with_param("returnAll", true);
    let records = node_for(&server).execute(&[request]).await.unwrap();

    assert_eq!(records.len(), 45);
    assert_eq!(records[0], json!({ "id": 1, "email": "c1@example.com" }));
    assert_eq!(records[44]["id"], 45);
}

#[tokio::test]
async fn test_paginate_respects_max_results_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/contacts"))
        .and(query_param("start", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(contacts_page(1..31)))
        .expect(1)
        .mount(&server)
        .await;

    let client = MauticClient::new(
        &server.uri(),
        AuthConfig::basic("admin", "secret"),
        Default::default(),
    )
    .unwrap();
    let fetcher = EndpointFetcher::get(&client, "/contacts");
    let items = paginate(&fetcher, "contacts", &QueryParams::new(), Some(10))
        .await
        .unwrap();

    assert_eq!(items.len(), 10);
}

// ============================================================================
// Filters
// ============================================================================

#[tokio::test]
async fn test_where_conditions_reach_the_wire() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/contacts"))
        .and(query_param("where[0][col]", "email"))
        .and(query_param("where[0][expr]", "like"))
        .and(query_param("where[0][val]", "%@example.com"))
        .and(query_param("where[1][expr]", "orX"))
        .and(query_param("where[1][val][0][col]", "city"))
        .and(query_param("search", "segment:news"))
        .respond_with(ResponseTemplate::new(200).set_body_json(contacts_page(1..3)))
        .expect(1)
        .mount(&server)
        .await;

    let request = OperationRequest::new("contact", "getAll").with_param(
        "options",
        json!({
            "segments": "news",
            "where": [
                { "col": "email", "expr": "like", "val": "%@example.com" },
                { "expr": "orX", "nested": [
                    { "col": "city", "expr": "eq", "val": "Paris" },
                    { "col": "city", "expr": "eq", "val": "Lyon" }
                ] }
            ]
        }),
    );
    let records = node_for(&server).execute(&[request]).await.unwrap();
    assert_eq!(records.len(), 2);
}

#[test]
fn test_compile_where_from_json() {
    let nodes = FilterNode::parse_list(&json!({
        "conditions": [{ "col": "points", "expr": "gte", "val": 10 }]
    }))
    .unwrap();

    assert_eq!(
        compile_where(&nodes).to_pairs(),
        vec![
            ("where[0][col]".to_string(), "points".to_string()),
            ("where[0][expr]".to_string(), "gte".to_string()),
            ("where[0][val]".to_string(), "10".to_string()),
        ]
    );
}

// ============================================================================
// Operations
// ============================================================================

#[tokio::test]
async fn test_contact_create_sends_basic_auth_and_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/contacts/new"))
        .and(header("Authorization", "Basic YWRtaW46c2VjcmV0"))
        .and(body_json(json!({ "email": "ada@example.com", "firstname": "Ada" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "contact": { "id": 9, "fields": { "all": { "id": "9", "email": "ada@example.com" } } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = OperationRequest::new("contact", "create")
        .with_param("email", "ada@example.com")
        .with_param("firstName", "Ada");
    let records = node_for(&server).execute(&[request]).await.unwrap();

    assert_eq!(records, vec![json!({ "id": "9", "email": "ada@example.com" })]);
}

#[tokio::test]
async fn test_not_found_is_reported_per_item_with_continue_on_fail() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/companies/404"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "errors": [{ "code": 404, "message": "Item was not found." }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/companies/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "company": { "id": 1, "fields": { "all": { "companyname": "Acme" } } }
        })))
        .mount(&server)
        .await;

    let node = node_for(&server).with_continue_on_fail(true);
    let records = node
        .execute(&[
            OperationRequest::new("company", "get").with_param("companyId", 404),
            OperationRequest::new("company", "get")
                .with_param("companyId", 1)
                .with_param("simple", true),
        ])
        .await
        .unwrap();

    assert_eq!(
        records,
        vec![
            json!({ "error": "Company not found during get operation." }),
            json!({ "companyname": "Acme" }),
        ]
    );
}

#[tokio::test]
async fn test_error_payload_in_success_response_fails() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [{ "code": 403, "message": "You do not have access." }]
        })))
        .mount(&server)
        .await;

    let err = node_for(&server)
        .execute(&[OperationRequest::new("stats", "getAvailableTables")])
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Permission denied for getAvailableTables Stats. Please check your API credentials."
    );
}

#[tokio::test]
async fn test_v7_tags_use_v2_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/tags"))
        .and(header("Content-Type", "application/json"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": { "id": "12", "type": "tags", "attributes": { "tag": "vip" } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let node = node_for(&server).with_version(MauticVersion::V7);
    let records = node
        .execute(&[OperationRequest::new("tag", "create").with_param("tag", "vip")])
        .await
        .unwrap();
    assert_eq!(records, vec![json!({ "id": 12, "tag": "vip" })]);
}

#[tokio::test]
async fn test_list_segments_reads_all_pages() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/segments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 2,
            "lists": { "3": { "id": 3, "name": "Newsletter" }, "4": { "id": 4, "name": "VIP" } }
        })))
        .mount(&server)
        .await;

    let options = node_for(&server).list_segments().await.unwrap();
    let names: Vec<&str> = options.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["Newsletter", "VIP"]);
    assert_eq!(options[0].value, "3");
}

#[tokio::test]
async fn test_check_calls_users_self() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/users/self"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 1, "username": "admin" })))
        .expect(1)
        .mount(&server)
        .await;

    let user = node_for(&server).check().await.unwrap();
    assert_eq!(user["username"], "admin");
}

#[tokio::test]
async fn test_client_implements_request_seam() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/stages/2/delete"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let config = ConnectionConfig::new(server.uri(), AuthConfig::basic("admin", "secret"));
    let client = config.client().unwrap();
    let body = client
        .request(mautic_connector::ApiRequest::new(
            mautic_connector::Method::DELETE,
            "/stages/2/delete",
        ))
        .await
        .unwrap();
    assert_eq!(body, Value::Null);
}

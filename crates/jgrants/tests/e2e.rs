// SPDX-FileCopyrightText: 2026 jgrants-search Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests of the subsidy service against mock upstreams.
//!
//! Each test creates an isolated TestHarness with its own mock server.
//! Tests are independent and order-insensitive.

use std::time::{Duration, Instant};

use jgrants_config::model::TransportKind;
use jgrants_core::types::{
    AcceptanceStatus, AccessDescriptor, EmployeeBand, RenderedContent, SearchQuery,
    SubsidySummary, UsePurpose,
};
use jgrants_core::{FailureCause, JgrantsError};
use jgrants_test_utils::{MockReply, TestHarness};
use serde_json::json;

// ---- Direct transport: search ----

#[tokio::test]
async fn accepting_keyword_search_returns_normalized_summaries() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness
        .mount_json(
            "/subsidies",
            json!({"result": [{"id": "A001", "title": "X補助金"}]}),
        )
        .await;

    let query = SearchQuery::new("事業");
    assert!(query.accepting_only);
    let results = harness.service.search(&query).await.unwrap();

    assert_eq!(
        results,
        vec![SubsidySummary {
            id: Some("A001".into()),
            title: Some("X補助金".into()),
            ..SubsidySummary::default()
        }]
    );

    let requests = harness.server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let pairs: Vec<(String, String)> = requests[0]
        .url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    assert!(pairs.contains(&("keyword".into(), "事業".into())));
    assert!(pairs.contains(&("acceptance".into(), "1".into())));
    assert!(pairs.contains(&("sort".into(), "acceptance_end_datetime".into())));
    assert!(pairs.contains(&("order".into(), "ASC".into())));
}

#[tokio::test]
async fn two_server_errors_then_success() {
    let harness = TestHarness::builder().with_retry(3, 10).build().await.unwrap();
    harness.mount_failures("/subsidies", 503, 2).await;
    harness
        .mount_json("/subsidies", json!({"result": [{"id": "A001", "title": "X補助金"}]}))
        .await;

    let started = Instant::now();
    let results = harness
        .service
        .search(&SearchQuery::new("事業"))
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(harness.request_count().await, 3);
    // 10ms + 20ms of backoff.
    assert!(started.elapsed() >= Duration::from_millis(30));
}

#[tokio::test]
async fn client_error_is_a_single_attempt() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness.mount_failures("/subsidies", 400, 10).await;

    let err = harness
        .service
        .search(&SearchQuery::new("事業"))
        .await
        .unwrap_err();

    assert_eq!(err.http_status(), Some(400));
    assert_eq!(err.cause(), FailureCause::ClientError);
    assert_eq!(harness.request_count().await, 1);
}

#[tokio::test]
async fn persistent_server_errors_exhaust_retries() {
    let harness = TestHarness::builder().with_retry(3, 5).build().await.unwrap();
    harness.mount_failures("/subsidies", 502, 10).await;

    let err = harness
        .service
        .search(&SearchQuery::new("事業"))
        .await
        .unwrap_err();

    match &err {
        JgrantsError::RetriesExhausted { attempts, .. } => assert_eq!(*attempts, 3),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.cause(), FailureCause::ServerError);
    assert_eq!(harness.request_count().await, 3);
}

#[tokio::test]
async fn short_keyword_is_rejected_before_any_request() {
    let harness = TestHarness::builder().build().await.unwrap();
    let err = harness
        .service
        .search(&SearchQuery::new("a"))
        .await
        .unwrap_err();
    assert_eq!(err.cause(), FailureCause::InvalidInput);
    assert_eq!(harness.request_count().await, 0);
}

// ---- Extraction ----

#[tokio::test]
async fn extracted_filters_reach_the_upstream() {
    let harness = TestHarness::builder()
        .with_mock_replies(vec![MockReply::Structured(json!({
            "keyword": "DX",
            "employee_band": "20名以下",
            "use_purpose": "設備整備・IT導入をしたい"
        }))])
        .build()
        .await
        .unwrap();
    harness.mount_json("/subsidies", json!({"result": []})).await;

    let outcome = harness
        .service
        .search_text("小規模事業者のデジタル化を支援する補助金")
        .await
        .unwrap();

    assert_eq!(outcome.degraded, None);
    assert_eq!(outcome.query.keyword, "DX");
    assert_eq!(outcome.query.employee_band, Some(EmployeeBand::UpTo20));
    assert_eq!(outcome.query.use_purpose, Some(UsePurpose::EquipmentIt));
    assert!(outcome.results.is_empty());

    let requests = harness.server.received_requests().await.unwrap();
    let pairs: Vec<(String, String)> = requests[0]
        .url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    assert!(pairs.contains(&("target_number_of_employees".into(), "20名以下".into())));
    assert!(pairs.contains(&("use_purpose".into(), "設備整備・IT導入をしたい".into())));
    assert!(pairs.contains(&("keyword".into(), "DX".into())));

    let provider = harness.provider.as_ref().unwrap();
    assert_eq!(provider.requests().await.len(), 1);
}

#[tokio::test]
async fn provider_failure_falls_back_to_literal_keyword() {
    let harness = TestHarness::builder()
        .with_mock_replies(vec![MockReply::Failure("overloaded".into())])
        .build()
        .await
        .unwrap();
    harness
        .mount_json("/subsidies", json!({"result": [{"id": "A001", "title": "X補助金"}]}))
        .await;

    let outcome = harness.service.search_text("省エネ設備").await.unwrap();
    assert_eq!(outcome.query, SearchQuery::new("省エネ設備"));
    assert!(outcome.degraded.is_some());
    assert_eq!(outcome.results.len(), 1);
}

// ---- Direct transport: detail and attachments ----

#[tokio::test]
async fn detail_and_inline_attachment() {
    let harness = TestHarness::builder()
        .with_missing_status(AcceptanceStatus::Accepting)
        .build()
        .await
        .unwrap();
    harness
        .mount_json(
            "/subsidies/id/A001",
            json!({"result": [{
                "id": "A001",
                "title": "X補助金",
                "detail": "<p>概要</p>",
                "front_subsidy_detail_page_url": "https://www.jgrants-portal.go.jp/subsidy/A001",
                "application_guidelines": [{"name": "guide.md", "data": "IyDlhazli5/opoHpoJg="}]
            }]}),
        )
        .await;

    let detail = harness.service.get_detail("A001").await.unwrap();
    assert_eq!(detail.summary.title.as_deref(), Some("X補助金"));
    assert_eq!(detail.status, AcceptanceStatus::Accepting);
    assert_eq!(detail.attachments.len(), 1);

    let content = harness
        .service
        .get_file_content(&detail.attachments[0].access)
        .await
        .unwrap();
    assert!(matches!(content, RenderedContent::Markdown { ref text, .. } if text == "# 公募要領"));
}

#[tokio::test]
async fn unknown_id_is_not_found() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness
        .mount_json("/subsidies/id/missing", json!({"result": []}))
        .await;

    let err = harness.service.get_detail("missing").await.unwrap_err();
    assert!(matches!(err, JgrantsError::NotFound { ref id } if id == "missing"));
    assert_eq!(err.cause(), FailureCause::NotFound);
}

// ---- Protocol transport ----

#[tokio::test]
async fn mcp_search_and_detail() {
    let harness = TestHarness::builder()
        .with_transport(TransportKind::Mcp)
        .build()
        .await
        .unwrap();
    harness.mount_mcp_session("s-e2e").await;
    harness
        .mount_mcp_tool(
            "search_subsidies",
            json!({"total_count": 1, "subsidies": [{"id": "A001", "title": "X補助金"}]}),
        )
        .await;
    harness
        .mount_mcp_tool(
            "get_subsidy_detail",
            json!({
                "id": "A001",
                "title": "X補助金",
                "status": "受付中",
                "files": {
                    "application_form": [{
                        "name": "form.xlsx",
                        "size": 2048,
                        "mcp_access": {"tool": "get_file_content", "params": {"subsidy_id": "A001", "filename": "form.xlsx"}}
                    }]
                }
            }),
        )
        .await;

    let results = harness
        .service
        .search(&SearchQuery::new("事業"))
        .await
        .unwrap();
    assert_eq!(results[0].id.as_deref(), Some("A001"));

    let detail = harness.service.get_detail("A001").await.unwrap();
    assert_eq!(detail.status, AcceptanceStatus::Accepting);
    assert!(matches!(
        detail.attachments[0].access,
        AccessDescriptor::Tool { ref tool, .. } if tool == "get_file_content"
    ));

    // One handshake, one notification, two tool calls.
    assert_eq!(harness.request_count().await, 4);
}

#[tokio::test]
async fn mcp_not_found_message_maps_to_not_found() {
    let harness = TestHarness::builder()
        .with_transport(TransportKind::Mcp)
        .build()
        .await
        .unwrap();
    harness.mount_mcp_session("s-e2e").await;
    harness
        .mount_mcp_tool(
            "get_subsidy_detail",
            json!({"error": "補助金が見つかりません"}),
        )
        .await;

    let err = harness.service.get_detail("Z999").await.unwrap_err();
    assert!(matches!(err, JgrantsError::NotFound { .. }));
}

#[tokio::test]
async fn mcp_overview_is_served_by_the_tool() {
    let harness = TestHarness::builder()
        .with_transport(TransportKind::Mcp)
        .build()
        .await
        .unwrap();
    harness.mount_mcp_session("s-e2e").await;
    harness
        .mount_mcp_tool(
            "get_subsidy_overview",
            json!({
                "total_count": 12,
                "by_deadline_period": {"this_month": 3, "next_month": 4, "after_next_month": 5},
                "by_amount_range": {"under_1m": 1, "under_10m": 6, "under_100m": 4, "over_100m": 1},
                "urgent_deadlines": [{"id": "A001", "title": "X補助金", "days_left": 2}]
            }),
        )
        .await;

    let overview = harness.service.overview().await.unwrap();
    assert_eq!(overview.total_count, 12);
    assert_eq!(overview.by_deadline_period.next_month, 4);
    assert_eq!(overview.urgent_deadlines[0].days_left, 2);
}

#[tokio::test]
async fn mcp_handshake_failure_makes_no_tool_call() {
    let harness = TestHarness::builder()
        .with_transport(TransportKind::Mcp)
        .build()
        .await
        .unwrap();
    // Nothing mounted: the handshake gets a 404.

    let err = harness
        .service
        .search(&SearchQuery::new("事業"))
        .await
        .unwrap_err();
    assert!(matches!(err, JgrantsError::Session(_)));
    // A rejected handshake is not repeated within one call.
    let requests = harness.server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["method"], "initialize");
}

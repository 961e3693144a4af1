#![cfg(feature = "web")]
//! Web handler integration tests.
//!
//! Tests cover:
//! - Analysis requests: success, legacy body, validation and metal errors
//! - Metals overview keys and empty lists for failing tickers
//! - Health, fallback and CORS headers

mod common;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use metalcorr::adapters::web::{AppState, build_router};
use metalcorr::domain::ticker::TickerTable;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

use common::*;

fn mock_port() -> MockDataPort {
    MockDataPort::new()
        .with_closes("AAPL", &[("2024-01-02", 100.0), ("2024-01-03", 102.0)])
        .with_closes("MSFT", &[("2024-01-02", 300.0), ("2024-01-03", 299.0)])
        .with_closes("GC=F", &[("2024-01-02", 2000.0), ("2024-01-03", 2010.0)])
        .with_name("AAPL", "Apple Inc.")
        .with_error("TIN.L", "HTTP 404")
}

fn create_test_app() -> Router {
    let tickers = TickerTable::new(
        vec![
            ("Gold".to_string(), "GC=F".to_string()),
            ("Tin".to_string(), "TIN.L".to_string()),
        ],
        vec![("DJUSST".to_string(), "^DJUSST".to_string())],
    );
    build_router(AppState {
        data_port: Arc::new(mock_port()),
        tickers,
        lookback_days: 730,
        metals_lookback_days: 1095,
    })
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(request: Request<Body>) -> (StatusCode, Value) {
    let response = create_test_app().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap())
}

mod analyze_tests {
    use super::*;

    #[tokio::test]
    async fn analyze_with_metal_returns_correlations() {
        let (status, body) = send(post_json(
            "/api/analyze",
            r#"{"stock_ids": ["AAPL", "MSFT"], "metal": "Gold"}"#,
        ))
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["metal_ticker"], "GC=F");
        assert_eq!(body["stock_results"].as_array().unwrap().len(), 2);
        assert_eq!(body["stock_results"][0]["stock_name"], "Apple Inc.");
        assert_eq!(body["stock_results"][0]["data"].as_array().unwrap().len(), 2);
        assert_eq!(body["stock_vs_stock"][0]["stock1"], "AAPL");
        assert_eq!(body["stock_vs_stock"][0]["stock2"], "MSFT");
    }

    #[tokio::test]
    async fn bare_route_matches_api_route() {
        let (status, body) = send(post_json("/analyze", r#"{"stock_ids": ["AAPL"]}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["metal_ticker"].is_null());
        assert!(body["stock_results"][0]["correlation"].is_null());
    }

    #[tokio::test]
    async fn legacy_stock_id_is_accepted() {
        let (status, body) = send(post_json("/api/analyze", r#"{"stock_id": "MSFT"}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stock_results"][0]["stock_id"], "MSFT");
    }

    #[tokio::test]
    async fn missing_stock_ids_is_bad_request() {
        let (status, body) = send(post_json("/api/analyze", r#"{"metal": "Gold"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Missing stock_ids" }));
    }

    #[tokio::test]
    async fn empty_stock_list_is_bad_request() {
        let (status, _) = send(post_json("/api/analyze", r#"{"stock_ids": ["", "  "]}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let (status, body) = send(post_json("/api/analyze", "{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn invalid_date_is_bad_request() {
        let (status, body) = send(post_json(
            "/api/analyze",
            r#"{"stock_ids": ["AAPL"], "start_date": "2024/01/01", "end_date": "2024-06-01"}"#,
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("2024/01/01"));
    }

    #[tokio::test]
    async fn reversed_range_is_bad_request() {
        let (status, _) = send(post_json(
            "/api/analyze",
            r#"{"stock_ids": ["AAPL"], "start_date": "2024-06-01", "end_date": "2024-01-01"}"#,
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_metal_is_not_found() {
        let (status, body) = send(post_json(
            "/api/analyze",
            r#"{"stock_ids": ["AAPL"], "metal": "Unobtainium"}"#,
        ))
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body,
            json!({ "error": "Could not fetch data for metal: Unobtainium" })
        );
    }

    #[tokio::test]
    async fn failing_stock_is_reported_inline() {
        let (status, body) = send(post_json(
            "/api/analyze",
            r#"{"stock_ids": ["AAPL", "NOPE"]}"#,
        ))
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stock_results"][1]["error"], "No data");
        assert!(body["stock_vs_stock"].as_array().unwrap().is_empty());
    }
}

mod metals_tests {
    use super::*;

    #[tokio::test]
    async fn metals_lists_every_table_entry() {
        let (status, body) = send(get("/api/metals")).await;

        assert_eq!(status, StatusCode::OK);
        let map = body.as_object().unwrap();
        assert_eq!(map.len(), 3);

        let gold = map["Gold"].as_array().unwrap();
        assert_eq!(gold.len(), 2);
        assert_eq!(gold[0]["x"], "2024-01-02");
        assert_eq!(gold[0]["y"], json!([2000.0, 2000.0, 2000.0, 2000.0]));
    }

    #[tokio::test]
    async fn failing_and_empty_tickers_yield_empty_lists() {
        let (_, body) = send(get("/metals")).await;
        assert_eq!(body["Tin"], json!([]));
        assert_eq!(body["DJUSST"], json!([]));
    }
}

mod misc_tests {
    use super::*;

    #[tokio::test]
    async fn health_reports_ok() {
        let (status, body) = send(get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn unknown_route_is_json_not_found() {
        let (status, body) = send(get("/nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn cors_allows_any_origin() {
        let request = Request::builder()
            .uri("/health")
            .header(header::ORIGIN, "http://localhost:3000")
            .body(Body::empty())
            .unwrap();
        let response = create_test_app().oneshot(request).await.unwrap();
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }
}

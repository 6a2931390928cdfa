// HTTP API tests in mock mode
// Author: Gabriel Demetrios Lafis

use actix_web::{http::StatusCode, test, web, App};
use serde_json::Value;

use site_performance_engine::{
    api::{configure, AppState},
    utils::Config,
};

fn mock_state() -> web::Data<AppState> {
    let mut config = Config::default();
    config.data.mock_mode = true;
    config.data.seed = Some(42);
    web::Data::new(AppState::new(config, None))
}

macro_rules! app {
    ($state:expr) => {
        test::init_service(App::new().app_data($state.clone()).configure(configure)).await
    };
}

#[actix_web::test]
async fn test_health() {
    let state = mock_state();
    let app = app!(state);

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "ok");
}

#[actix_web::test]
async fn test_top_queries_from_synthetic_data() {
    let state = mock_state();
    let app = app!(state);

    let req = test::TestRequest::get()
        .uri("/api/v1/top/query?metric=clicks&top_n=3&range=Last%2028%20days")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["info"]["source"], "synthetic");
    assert_eq!(body["dimension"], "query");
    let rows = body["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert!(rows[0]["clicks"].as_u64().unwrap() >= rows[1]["clicks"].as_u64().unwrap());
}

#[actix_web::test]
async fn test_position_ranks_ascending() {
    let state = mock_state();
    let app = app!(state);

    let req = test::TestRequest::get()
        .uri("/api/v1/top/country?metric=position&top_n=5")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    let positions: Vec<f64> = body["rows"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["position"].as_f64().unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] <= w[1]));
}

#[actix_web::test]
async fn test_invalid_arguments_are_bad_requests() {
    let state = mock_state();
    let app = app!(state);

    for uri in [
        "/api/v1/top/city",
        "/api/v1/top/query?metric=sessions",
        "/api/v1/top/query?top_n=0",
    ] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", uri);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "validation_error");
    }
}

#[actix_web::test]
async fn test_sites_unavailable_in_mock_mode() {
    let state = mock_state();
    let app = app!(state);

    let req = test::TestRequest::get().uri("/api/v1/sites").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[actix_web::test]
async fn test_records_are_paged_and_cached() {
    let state = mock_state();
    let app = app!(state);

    let req = test::TestRequest::get()
        .uri("/api/v1/records?range=Last%207%20days&limit=5&offset=2")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    // 8 days of 17 synthetic rows each
    assert_eq!(body["total"], 8 * 17);
    assert_eq!(body["records"].as_array().unwrap().len(), 5);
    assert_eq!(body["info"]["redacted_count"], 0);

    let req = test::TestRequest::get()
        .uri("/api/v1/summary?range=Last%207%20days")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["summary"]["row_count"], 8 * 17);

    assert_eq!(state.cache().stats().misses, 1);
    assert_eq!(state.cache().stats().hits, 1);
}

#[actix_web::test]
async fn test_time_series_is_sorted() {
    let state = mock_state();
    let app = app!(state);

    let req = test::TestRequest::get()
        .uri("/api/v1/timeseries?range=7%20Hari%20Terakhir")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    let keys: Vec<&str> = body["points"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["key"].as_str().unwrap())
        .collect();
    assert_eq!(keys.len(), 8);
    assert!(keys.windows(2).all(|w| w[0] < w[1]));
}

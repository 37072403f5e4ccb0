//! Integration tests for `DirectApiStrategy` and the orchestrator on top of it.
//!
//! Every test stands up a local `wiremock` server in place of the upstream
//! dining API, so no real network traffic is made.

use std::sync::Arc;

use chrono::NaiveDate;
use nufood_core::{LocationConfig, MealServiceConfig, MemoryStore};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use nufood_scraper::{AcquisitionStrategy, DirectApiStrategy, FetchErrorKind, Orchestrator, RetryPolicy, ScraperError};

fn test_strategy(server: &MockServer) -> DirectApiStrategy {
    DirectApiStrategy::new(&server.uri(), "site-test", 5, "nufood-test/0.1").expect("failed to build test strategy")
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 12, 16).unwrap()
}

fn sargent() -> LocationConfig {
    LocationConfig {
        name: "Sargent".into(),
        id: "loc-sargent".into(),
        slug: "sargent".into(),
        services: vec![
            MealServiceConfig {
                meal: "Breakfast".into(),
                id: "svc-breakfast".into(),
            },
            MealServiceConfig {
                meal: "Lunch".into(),
                id: "svc-lunch".into(),
            },
        ],
    }
}

fn breakfast_json() -> serde_json::Value {
    json!({
        "status": "success",
        "closed": false,
        "menu": {
            "date": "2024-12-16",
            "periods": {
                "name": "Breakfast",
                "categories": [
                    {"name": "salad bar 1", "items": [{"name": "Tomato", "portion": "1 oz"}]},
                    {"name": "Comfort", "items": [
                        {"name": "Pancakes", "desc": "Delicious pancakes", "portion": "2 each",
                         "nutrients": [
                            {"name": "Calories", "value": "340"},
                            {"name": "Protein (g)", "value": "9g"},
                            {"name": "Total Carbohydrates (g)", "value": 58},
                            {"name": "Total Fat (g)", "value": "-"}
                         ]},
                        {"name": "Butter", "portion": "1 each"}
                    ]}
                ]
            }
        }
    })
}

fn closed_json() -> serde_json::Value {
    json!({"status": "success", "closed": true, "menu": {"periods": {"categories": []}}})
}

async fn mount_service(server: &MockServer, service: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("/location/loc-sargent/periods/{service}")))
        .and(query_param("platform", "0"))
        .and(query_param("date", "2024-12-16"))
        .respond_with(response)
        .mount(server)
        .await;
}

// ---------------------------------------------------------------------------
// Menus
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_day_menu_filters_and_normalizes() {
    let server = MockServer::start().await;
    mount_service(&server, "svc-breakfast", ResponseTemplate::new(200).set_body_json(breakfast_json())).await;
    mount_service(&server, "svc-lunch", ResponseTemplate::new(200).set_body_json(closed_json())).await;

    let menu = test_strategy(&server)
        .fetch_day_menu(&sargent(), date())
        .await
        .expect("menu should load");

    assert_eq!(menu.items.len(), 1, "only Pancakes survives filtering");
    let pancakes = &menu.items[0];
    assert_eq!(pancakes.name, "Pancakes");
    assert_eq!(pancakes.description, "Delicious pancakes");
    assert_eq!(pancakes.station, "Comfort");
    assert_eq!(pancakes.meal, "Breakfast");
    assert_eq!(pancakes.location, "Sargent");
    assert_eq!(pancakes.date, date());
    assert_eq!(pancakes.nutrition.calories, Some(340.0));
    assert_eq!(pancakes.nutrition.protein_g, Some(9.0));
    assert_eq!(pancakes.nutrition.carbs_g, Some(58.0));
    assert_eq!(pancakes.nutrition.fat_g, None);
    assert_eq!(menu.unique_names.len(), 1);
    assert!(!menu.closed);
}

#[tokio::test]
async fn every_service_closed_marks_location_closed() {
    let server = MockServer::start().await;
    mount_service(&server, "svc-breakfast", ResponseTemplate::new(200).set_body_json(closed_json())).await;
    mount_service(&server, "svc-lunch", ResponseTemplate::new(200).set_body_json(closed_json())).await;

    let menu = test_strategy(&server).fetch_day_menu(&sargent(), date()).await.unwrap();
    assert!(menu.closed);
    assert!(menu.items.is_empty());
}

#[tokio::test]
async fn one_failing_service_keeps_the_other() {
    let server = MockServer::start().await;
    mount_service(&server, "svc-breakfast", ResponseTemplate::new(200).set_body_json(breakfast_json())).await;
    mount_service(&server, "svc-lunch", ResponseTemplate::new(500)).await;

    let menu = test_strategy(&server).fetch_day_menu(&sargent(), date()).await.unwrap();
    assert_eq!(menu.items.len(), 1);
}

#[tokio::test]
async fn every_service_failing_is_an_error() {
    let server = MockServer::start().await;
    mount_service(&server, "svc-breakfast", ResponseTemplate::new(503)).await;
    mount_service(&server, "svc-lunch", ResponseTemplate::new(503)).await;

    let err = test_strategy(&server).fetch_day_menu(&sargent(), date()).await.unwrap_err();
    assert!(
        matches!(err, ScraperError::AllServicesFailed { .. }),
        "expected AllServicesFailed, got: {err:?}"
    );
    assert_eq!(err.kind(), Some(FetchErrorKind::Network));
}

#[tokio::test]
async fn invalid_json_is_malformed_payload() {
    let server = MockServer::start().await;
    mount_service(&server, "svc-breakfast", ResponseTemplate::new(200).set_body_string("{\"menu\": [")).await;
    mount_service(&server, "svc-lunch", ResponseTemplate::new(200).set_body_string("<html>")).await;

    let err = test_strategy(&server).fetch_day_menu(&sargent(), date()).await.unwrap_err();
    assert_eq!(err.class_name(), "malformed_payload");
}

// ---------------------------------------------------------------------------
// Hours
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_week_hours_converts_schedule() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/locations/weekly_schedule"))
        .and(query_param("site_id", "site-test"))
        .and(query_param("date", "2024-12-16"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "the_locations": [{
                "id": "loc-allison",
                "active": true,
                "name": "Allison Dining Commons",
                "week": [
                    {"day": 0, "date": "2024-12-15", "status": "open",
                     "hours": [{"start_hour": 10, "start_minutes": 30, "end_hour": 14, "end_minutes": 0}]},
                    {"day": 1, "date": "2024-12-16", "status": "closed", "hours": [], "closed": true}
                ]
            }]
        })))
        .mount(&server)
        .await;

    let hours = test_strategy(&server).fetch_week_hours(date()).await.unwrap();

    assert_eq!(hours.len(), 1);
    assert_eq!(hours[0].name, "Allison Dining Commons");
    assert_eq!(hours[0].week[0].hours[0].start_minutes, 30);
    assert_eq!(hours[0].week[1].status, nufood_core::DayStatus::Closed);
}

// ---------------------------------------------------------------------------
// Orchestrated retry over HTTP
// ---------------------------------------------------------------------------

#[tokio::test]
async fn transient_errors_are_retried_until_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/location/loc-sargent/periods/svc-breakfast"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_service(&server, "svc-breakfast", ResponseTemplate::new(200).set_body_json(breakfast_json())).await;
    mount_service(&server, "svc-lunch", ResponseTemplate::new(500)).await;

    let store = Arc::new(MemoryStore::new());
    let orchestrator = Orchestrator::new(
        Arc::new(test_strategy(&server)),
        store.clone(),
        vec![sargent()],
        RetryPolicy::immediate(3),
        3,
    );

    let summary = orchestrator.refresh_daily(date()).await.unwrap();

    assert_eq!(summary.items_written, 1);
    assert_eq!(store.unique_names(), vec!["Pancakes".to_string()]);
}

#[tokio::test]
async fn exhausted_budget_reports_no_data() {
    let server = MockServer::start().await;
    mount_service(&server, "svc-breakfast", ResponseTemplate::new(500)).await;
    mount_service(&server, "svc-lunch", ResponseTemplate::new(500)).await;

    let orchestrator = Orchestrator::new(
        Arc::new(test_strategy(&server)),
        Arc::new(MemoryStore::new()),
        vec![sargent()],
        RetryPolicy::immediate(2),
        3,
    );

    let err = orchestrator.scrape_day(date()).await.unwrap_err();
    assert!(matches!(err, ScraperError::NoDataForAnyLocation { .. }));

    let requests = server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 4, "two services, two attempts each");
}

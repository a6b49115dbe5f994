//! Workflows against a local mock of the scoring service.

use std::sync::Arc;
use std::time::Duration;

use impact_config::{AbacaConfig, ImpactConfig, PollConfig, RetryConfig, Secret};
use impact_core::{
    AbacaSource, ApiClient, AssetApi, AssetBackend, AssetReportDraft,
    GroupReportDraft, ImpactError, Reconciler, ReportService, ValidationError,
};
use impact_model::{AssetCreateInput, BreakdownItem, OutcomeStatus};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KEY: &str = "test-key";

fn config(server: &MockServer) -> ImpactConfig {
    let mut config = ImpactConfig::default();
    config.api.base_url = Url::parse(&format!("{}/v2", server.uri())).unwrap();
    config.api.api_key = Some(Secret::new(KEY));
    config.retry = RetryConfig {
        max_attempts: 3,
        base_delay: Duration::from_millis(5),
        ..RetryConfig::default()
    };
    config.poll = PollConfig {
        interval: Duration::from_millis(5),
        max_attempts: Some(20),
        deadline: None,
    };
    config
}

fn acme_draft(breakdown: Value) -> AssetReportDraft {
    AssetReportDraft::from_json(json!({
        "asset": {
            "name": "Acme",
            "description": "Developer tooling",
            "industry": "Software",
            "hqCountryCode": "US",
            "numEmployees": 120
        },
        "basics": {
            "currency": "USD",
            "revenue": 5000000,
            "revenueGrowth": 0.12,
            "description": "Developer tooling",
            "hqCountryCode": "US",
            "industry": "Software",
            "name": "Acme",
            "numEmployees": 120
        },
        "breakdown": breakdown
    }))
    .unwrap()
}

fn abaca_config(server: &MockServer) -> ImpactConfig {
    let mut config = config(server);
    config.abaca = Some(AbacaConfig {
        base_url: Url::parse(&format!("{}/api/", server.uri())).unwrap(),
        token: Secret::new("abaca-token"),
    });
    config
}

fn search_results(results: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"query": "Acme", "results": results}))
}

/// The pre-create duplicate check finds nothing.
async fn mount_unlisted_acme(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v2/asset/search/name/Acme"))
        .respond_with(search_results(json!([])))
        .mount(server)
        .await;
}

fn posts_to(requests: &[wiremock::Request], target: &str) -> usize {
    requests
        .iter()
        .filter(|r| r.method.as_str() == "POST" && r.url.path() == target)
        .count()
}

fn status(value: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "status": value }))
}

async fn mount_compute(server: &MockServer, root: &str, id: &str) {
    let base = format!("/v2/{root}/id/{id}");
    for target in ["basics", "breakdown", "holdings"] {
        Mock::given(method("PUT"))
            .and(path(format!("{base}/{target}")))
            .respond_with(ResponseTemplate::new(200))
            .mount(server)
            .await;
    }
    Mock::given(method("POST"))
        .and(path(format!("{base}/impact/calculate")))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{base}/impact/status")))
        .respond_with(status("PENDING"))
        .up_to_n_times(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{base}/impact/status")))
        .respond_with(status("ACTIVE"))
        .up_to_n_times(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{base}/impact/status")))
        .respond_with(status("COMPLETED"))
        .mount(server)
        .await;
}

async fn body_of(server: &MockServer, http_method: &str, suffix: &str) -> Value {
    let requests = server.received_requests().await.unwrap_or_default();
    let request = requests
        .iter()
        .find(|r| r.method.as_str() == http_method && r.url.path().ends_with(suffix))
        .unwrap_or_else(|| panic!("no {http_method} request ending in {suffix}"));
    serde_json::from_slice(&request.body).unwrap()
}

#[tokio::test]
async fn new_asset_runs_the_full_workflow() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/asset"))
        .and(header("api-key", KEY))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "asset": {"id": "a-1", "name": "Acme", "industry": "Software"},
            "suggestedActivities": [
                {"id": 11, "industry": "Software", "name": "SaaS"},
                {"id": 12, "industry": "Software", "name": "Consulting"},
                {"id": 13, "industry": "Software", "name": "Hosting"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_unlisted_acme(&server).await;
    mount_compute(&server, "asset", "a-1").await;

    let service = ReportService::from_config(&config(&server)).unwrap();
    let outcome = service
        .generate_asset_report(acme_draft(json!([])), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.status, OutcomeStatus::Success);
    assert_eq!(outcome.id.as_str(), "a-1");

    let basics = body_of(&server, "PUT", "/basics").await;
    assert_eq!(basics["revenueGrowth"], json!(0.12));
    let breakdown = body_of(&server, "PUT", "/breakdown").await;
    let rows = breakdown["breakdown"].as_array().unwrap();
    assert_eq!(rows.len(), 3);
    for row in rows {
        assert_eq!(row["countryCode"], "US");
        assert!((row["weight"].as_f64().unwrap() - 1.0 / 3.0).abs() < 1e-9);
    }
}

#[tokio::test]
async fn conflicting_asset_is_adopted_and_short_circuits() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/asset"))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({"message": "Asset already exists"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    // Created concurrently: absent from the first listing, present after.
    Mock::given(method("GET"))
        .and(path("/v2/asset/search/name/Acme"))
        .respond_with(search_results(json!([])))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/asset/search/name/Acme"))
        .respond_with(search_results(json!([
            {"id": "other", "name": "Acme", "industry": "Mining"},
            {"id": "abc", "name": "Acme", "industry": "Software"}
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/asset/id/abc/impact/current"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"reportDate": "2024-05-01", "vestedImpactScore": 64.2})),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/asset/id/abc/impact/calculate"))
        .respond_with(ResponseTemplate::new(202))
        .expect(0)
        .mount(&server)
        .await;

    let service = ReportService::from_config(&config(&server)).unwrap();
    let outcome = service
        .generate_asset_report(acme_draft(json!([])), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.id.as_str(), "abc");
    assert_eq!(outcome.status, OutcomeStatus::Success);
    assert_eq!(outcome.message, "Asset already exists. Returning existing report.");
}

#[tokio::test]
async fn listed_asset_is_adopted_without_posting() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/asset/search/name/Acme"))
        .and(header("api-key", KEY))
        .respond_with(search_results(json!([
            {"id": "abc", "name": "Acme", "industry": "Software"}
        ])))
        .mount(&server)
        .await;
    // The service would happily accept a duplicate.
    Mock::given(method("POST"))
        .and(path("/v2/asset"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "asset": {"id": "dup-2", "name": "Acme", "industry": "Software"},
            "suggestedActivities": []
        })))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/asset/id/abc/impact/current"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"reportDate": "2024-05-01", "vestedImpactScore": 58.0})),
        )
        .mount(&server)
        .await;

    let service = ReportService::from_config(&config(&server)).unwrap();
    let outcome = service
        .generate_asset_report(acme_draft(json!([])), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.id.as_str(), "abc");
    assert_eq!(outcome.status, OutcomeStatus::Success);
    assert_eq!(outcome.message, "Asset already exists. Returning existing report.");
    let requests = server.received_requests().await.unwrap();
    assert_eq!(posts_to(&requests, "/v2/asset"), 0);
}

#[tokio::test]
async fn reconciling_the_same_asset_twice_yields_one_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/asset/search/name/Acme"))
        .respond_with(search_results(json!([])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/asset/search/name/Acme"))
        .respond_with(search_results(json!([
            {"id": "a-9", "name": "Acme", "industry": "Software"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/asset"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "asset": {"id": "a-9", "name": "Acme", "industry": "Software"},
            "suggestedActivities": [{"id": 11}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::from_config(&config(&server)).unwrap();
    let reconciler = Reconciler::new(Arc::new(AssetBackend::new(AssetApi::new(client))));
    let acme = AssetCreateInput {
        name: "Acme".into(),
        description: "Developer tooling".into(),
        industry: "Software".into(),
        hq_country_code: "US".into(),
        num_employees: 120,
    };

    let first = reconciler.reconcile(&acme).await.unwrap();
    let second = reconciler.reconcile(&acme).await.unwrap();

    assert_eq!(first.id.as_str(), "a-9");
    assert!(!first.pre_existing);
    assert_eq!(second.id, first.id);
    assert!(second.pre_existing);
}

#[tokio::test]
async fn transient_create_failures_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/asset"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/asset"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "asset": {"id": "a-2", "name": "Acme", "industry": "Software"},
            "suggestedActivities": [{"id": 11}]
        })))
        .mount(&server)
        .await;
    mount_unlisted_acme(&server).await;
    mount_compute(&server, "asset", "a-2").await;

    let service = ReportService::from_config(&config(&server)).unwrap();
    let outcome = service
        .generate_asset_report(
            acme_draft(json!([{"activityId": 11, "countryCode": "US", "weight": 1.0}])),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(outcome.is_success());
    let requests = server.received_requests().await.unwrap();
    assert_eq!(posts_to(&requests, "/v2/asset"), 3);
}

#[tokio::test]
async fn failed_calculation_keeps_the_resource() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/asset"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "asset": {"id": "a-3", "name": "Acme", "industry": "Software"},
            "suggestedActivities": [{"id": 11}]
        })))
        .mount(&server)
        .await;
    mount_unlisted_acme(&server).await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/asset/id/a-3/impact/calculate"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/asset/id/a-3/impact/status"))
        .respond_with(status("FAILED"))
        .mount(&server)
        .await;

    let service = ReportService::from_config(&config(&server)).unwrap();
    let outcome = service
        .generate_asset_report(acme_draft(json!([])), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.status, OutcomeStatus::Partial);
    assert_eq!(outcome.id.as_str(), "a-3");
}

#[tokio::test]
async fn invalid_input_never_reaches_the_network() {
    let server = MockServer::start().await;
    let service = ReportService::from_config(&config(&server)).unwrap();

    let draft = AssetReportDraft::from_json(json!({"asset": {"name": "Acme"}})).unwrap();
    let err = service
        .generate_asset_report(draft, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ImpactError::Validation(ValidationError::MissingFields(_))
    ));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_api_key_is_a_configuration_error() {
    let server = MockServer::start().await;
    let mut config = config(&server);
    config.api.api_key = None;

    let err = ReportService::from_config(&config).unwrap_err();
    assert!(matches!(err, ImpactError::Configuration(_)));
}

#[tokio::test]
async fn group_regeneration_purges_history_first() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/group"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Group with this name already exists"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/group/search/name/Climate%20Fund"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"id": "g-1", "name": "Climate Fund", "owner": "ops"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/group/id/g-1/impact/history"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "reports": [{"id": "r1"}, {"id": "r2"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v2/group/id/g-1/impact/id/r1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v2/group/id/g-1/impact/id/r2"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    mount_compute(&server, "group", "g-1").await;

    let draft = GroupReportDraft::from_json(json!({
        "group": {"name": "Climate Fund", "description": "Climate", "owner": "ops"},
        "holdings": {"holdings": [{"id": "a-1", "weight": 2}, {"id": "a-2", "weight": 2}]},
        "regenerate": true
    }))
    .unwrap();

    let service = ReportService::from_config(&config(&server)).unwrap();
    let outcome = service
        .generate_group_report(draft, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.id.as_str(), "g-1");
    assert_eq!(outcome.message, "Group processed successfully.");
    let holdings = body_of(&server, "PUT", "/holdings").await;
    assert_eq!(
        holdings,
        json!({"holdings": [{"id": "a-1", "weight": 0.5}, {"id": "a-2", "weight": 0.5}]})
    );
}

async fn mount_abaca_company(server: &MockServer, id: &str, company: Value, questions: Value) {
    let reads = [
        (format!("/api/companies/{id}/"), company),
        (format!("/api/companies/{id}/assessments/"), json!([])),
        (format!("/api/matching/questions-with-responses/{id}"), questions),
    ];
    for (target, body) in reads {
        Mock::given(method("GET"))
            .and(path(target))
            .and(header("authorization", "abaca-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(server)
            .await;
    }
}

#[tokio::test]
async fn abaca_company_answers_map_onto_basics_and_breakdown() {
    let server = MockServer::start().await;
    let breakdown = json!([
        {"activityId": 42, "weight": "0.6"},
        {"activityId": 43, "countryCode": "ES", "weight": 0.4},
        {"activityId": "n/a", "weight": 1}
    ])
    .to_string();
    mount_abaca_company(
        &server,
        "77",
        json!({
            "name": "Solar Co",
            "about": "Rooftop solar",
            "sectors": [{"name": "Energy"}],
            "locations": [{"country_code": "PT"}]
        }),
        json!([
            {"id": 2001, "responses": [{"value": "15"}]},
            {"id": 2002, "responses": [{"value": "EUR"}]},
            {"id": 2003, "responses": [{"value": "1200000"}]},
            {"id": 2004, "responses": [{"value": "steady"}]},
            {"id": 2005, "responses": [{"value": breakdown}]}
        ]),
    )
    .await;

    let inputs = AbacaSource::from_config(&abaca_config(&server))
        .unwrap()
        .company_inputs("77")
        .await
        .unwrap();

    let basics = &inputs.basics;
    assert_eq!(basics.name, "Solar Co");
    assert_eq!(basics.description, "Rooftop solar");
    assert_eq!(basics.industry, "Energy");
    assert_eq!(basics.hq_country_code, "PT");
    assert_eq!(basics.num_employees, 15);
    assert_eq!(basics.currency, "EUR");
    assert_eq!(basics.revenue, 1_200_000.0);
    assert_eq!(basics.revenue_growth, 0.0);
    assert_eq!(
        inputs.breakdown,
        vec![
            BreakdownItem::new(42, "PT", 0.6),
            BreakdownItem::new(43, "ES", 0.4),
        ]
    );
}

#[tokio::test]
async fn abaca_company_without_answers_falls_back_to_defaults() {
    let server = MockServer::start().await;
    mount_abaca_company(&server, "78", json!({}), json!([])).await;

    let inputs = AbacaSource::from_config(&abaca_config(&server))
        .unwrap()
        .company_inputs("78")
        .await
        .unwrap();

    let basics = &inputs.basics;
    assert_eq!(basics.name, "Unknown Company");
    assert_eq!(basics.industry, "General");
    assert_eq!(basics.hq_country_code, "US");
    assert_eq!(basics.currency, "USD");
    assert_eq!(basics.description, "");
    assert_eq!(basics.num_employees, 0);
    assert_eq!(basics.revenue, 0.0);
    assert!(inputs.breakdown.is_empty());
}

#[tokio::test]
async fn abaca_cohort_failure_surfaces_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/user/company-lists/u1/companies"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = AbacaSource::from_config(&abaca_config(&server))
        .unwrap()
        .cohort_inputs("u1")
        .await
        .unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(404));
}

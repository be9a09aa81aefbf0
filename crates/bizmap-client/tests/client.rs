//! Integration tests for `DirectoryClient` using wiremock HTTP mocks.

use bizmap_client::{DirectoryClient, DirectoryError};
use bizmap_view::{load_city, ViewOrchestrator};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> DirectoryClient {
    DirectoryClient::with_base_url(base_url, 30, "bizmap-test/0.1")
        .expect("client construction should not fail")
        .with_retry(2, 0)
}

fn helsinki_body() -> serde_json::Value {
    serde_json::json!([
        {
            "id": "1927400-1",
            "name": "Reaktor Oy",
            "industryCode": "62",
            "industryDescription": "Computer programming",
            "registeredAt": "2005-03-01",
            "active": true,
            "address": {
                "street": "Mannerheimintie",
                "buildingNumber": "2",
                "postalCode": "00100",
                "city": "Helsinki",
                "latitude": "60,1699",
                "longitude": 24.9384
            }
        },
        {
            "id": "0109862-8",
            "name": "Kesko Oyj",
            "industryCode": "",
            "active": true,
            "address": { "city": "Helsinki", "latitude": "", "longitude": null }
        },
        { "id": "1927400-1", "name": "Reaktor duplicate" }
    ])
}

#[tokio::test]
async fn fetch_records_by_city_normalizes_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/companies"))
        .and(query_param("city", "Helsinki"))
        .and(header("user-agent", "bizmap-test/0.1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(helsinki_body()))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let records = client
        .fetch_records_by_city("Helsinki")
        .await
        .expect("should parse records");

    assert_eq!(records.len(), 2, "duplicate id is dropped");
    let reaktor = &records[0];
    assert_eq!(reaktor.name, "Reaktor Oy");
    assert_eq!(reaktor.industry_code.as_deref(), Some("62"));
    let coords = reaktor.coordinates().expect("decimal comma parses");
    assert!((coords.latitude - 60.1699).abs() < 1e-9);

    let kesko = &records[1];
    assert_eq!(kesko.industry_code, None);
    assert_eq!(kesko.coordinates(), None);
    assert_eq!(kesko.city(), Some("Helsinki"));
}

#[tokio::test]
async fn unknown_city_yields_empty_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/companies"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let records = client.fetch_records_by_city("Atlantis").await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn fetch_city_list_trims_dedupes_and_sorts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cities"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!(["Turku", " Helsinki ", "", "Espoo", "Helsinki"])),
        )
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let cities = client.fetch_city_list().await.unwrap();
    assert_eq!(cities, ["Espoo", "Helsinki", "Turku"]);
}

#[tokio::test]
async fn base_url_path_prefix_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/cities"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!(["Oulu"])))
        .mount(&server)
        .await;

    let client = test_client(&format!("{}/api/v2/", server.uri()));
    assert_eq!(client.fetch_city_list().await.unwrap(), ["Oulu"]);
}

#[tokio::test]
async fn transient_server_error_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cities"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cities"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!(["Vaasa"])))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    assert_eq!(client.fetch_city_list().await.unwrap(), ["Vaasa"]);
}

#[tokio::test]
async fn client_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/companies"))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.fetch_records_by_city("Helsinki").await.unwrap_err();
    assert!(matches!(
        err,
        DirectoryError::UnexpectedStatus { status: 400, .. }
    ));
}

#[tokio::test]
async fn malformed_body_is_a_deserialize_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/companies"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{ not json"))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.fetch_records_by_city("Helsinki").await.unwrap_err();
    assert!(matches!(err, DirectoryError::Deserialize { .. }));
}

#[tokio::test]
async fn load_city_feeds_the_orchestrator() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/companies"))
        .and(query_param("city", "Helsinki"))
        .respond_with(ResponseTemplate::new(200).set_body_json(helsinki_body()))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let mut orchestrator = ViewOrchestrator::with_page_size(10);
    let count = load_city(&mut orchestrator, &client, "Helsinki")
        .await
        .unwrap();

    assert_eq!(count, 2);
    assert_eq!(orchestrator.filtered_count(), 2);
    assert_eq!(orchestrator.filter().city(), Some("Helsinki"));
}

#[tokio::test]
async fn failed_load_leaves_an_empty_view() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/companies"))
        .and(query_param("city", "Helsinki"))
        .respond_with(ResponseTemplate::new(200).set_body_json(helsinki_body()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/companies"))
        .and(query_param("city", "Tampere"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let mut orchestrator = ViewOrchestrator::default();
    load_city(&mut orchestrator, &client, "Helsinki").await.unwrap();
    assert_eq!(orchestrator.filtered_count(), 2);

    let err = load_city(&mut orchestrator, &client, "Tampere")
        .await
        .unwrap_err();
    assert!(matches!(err, DirectoryError::UnexpectedStatus { status: 500, .. }));
    assert_eq!(orchestrator.filtered_count(), 0);
    assert!(orchestrator.map_view().features.is_empty());
}

#[tokio::test]
async fn one_malformed_record_does_not_fail_the_city() {
    let server = MockServer::start().await;
    let body = serde_json::json!([
        { "id": "1", "name": "Good Oy", "industryCode": "62" },
        { "id": "2", "name": null },
        { "id": { "nested": true }, "name": "Broken id" },
        "not even an object",
        { "id": 3_012_345, "name": "Numbered Oy", "active": true }
    ]);
    Mock::given(method("GET"))
        .and(path("/companies"))
        .and(query_param("city", "Helsinki"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let records = client
        .fetch_records_by_city("Helsinki")
        .await
        .expect("good records survive a bad neighbour");

    let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["1", "2", "3012345"]);
    assert_eq!(records[1].name, "");
}

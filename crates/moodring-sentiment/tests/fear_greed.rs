//! Integration tests for `FearGreedClient` using wiremock HTTP mocks.

use moodring_sentiment::{
    Classification, FearGreedAnalyzer, FearGreedClient, HttpSettings, IndexSource,
    SentimentAnalyzer, SentimentError,
};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str, settings: &HttpSettings) -> FearGreedClient {
    FearGreedClient::new("Fear & Greed Index", &format!("{base_url}/fng/"), settings)
        .expect("client construction should not fail")
}

fn settings() -> HttpSettings {
    HttpSettings::new(5, "moodring-test/0.1")
}

fn index_body(value: &str, label: &str) -> serde_json::Value {
    serde_json::json!({
        "name": "Fear and Greed Index",
        "data": [
            {
                "value": value,
                "value_classification": label,
                "timestamp": "1700000000",
                "time_until_update": "3600"
            }
        ],
        "metadata": { "error": null }
    })
}

#[tokio::test]
async fn analyze_normalizes_index_reading() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/fng/"))
        .and(header("user-agent", "moodring-test/0.1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(index_body("75", "Greed")))
        .mount(&server)
        .await;

    let analyzer = FearGreedAnalyzer::new(test_client(&server.uri(), &settings()));
    let result = analyzer.analyze().await.expect("should analyze index");

    assert_eq!(result.value, 0.5);
    assert_eq!(result.classification, Classification::Greed);
    assert_eq!(result.interpretation, "Greed - Market is optimistic");
    assert_eq!(result.raw_data["original_classification"], "Greed");
    assert_eq!(result.timestamp.unwrap().timestamp(), 1_700_000_000);
}

#[tokio::test]
async fn extreme_fear_reading_suggests_buying_opportunity() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/fng/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(index_body("10", "Extreme Fear")))
        .mount(&server)
        .await;

    let analyzer = FearGreedAnalyzer::new(test_client(&server.uri(), &settings()));
    let result = analyzer.analyze().await.unwrap();

    assert!((result.value + 0.8).abs() < 1e-12);
    assert_eq!(result.classification, Classification::ExtremeFear);
    assert_eq!(
        result.interpretation,
        "Extreme Fear - Might be a buying opportunity"
    );
}

#[tokio::test]
async fn server_error_propagates_as_fetch_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let analyzer = FearGreedAnalyzer::new(test_client(&server.uri(), &settings()));
    let err = analyzer.analyze().await.unwrap_err();
    assert!(
        matches!(err, SentimentError::Fetch { ref source_name, .. } if source_name == "Fear & Greed Index"),
        "unexpected error: {err}"
    );

    let folded = analyzer.get_sentiment().await;
    assert_eq!(folded.classification, Classification::Error);
    assert_eq!(folded.value, 0.0);
}

#[tokio::test]
async fn empty_data_array_is_a_fetch_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "data": [] })))
        .mount(&server)
        .await;

    let err = test_client(&server.uri(), &settings())
        .fetch_index()
        .await
        .unwrap_err();
    assert!(err.to_string().contains("no data"));
}

#[tokio::test]
async fn transient_failure_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(index_body("50", "Neutral")))
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), &settings().with_retries(2, 1));
    let reading = client.fetch_index().await.expect("retry should recover");
    assert_eq!(reading.value, 50.0);
    assert_eq!(reading.label, "Neutral");
}

#[tokio::test]
async fn client_error_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), &settings().with_retries(3, 1));
    assert!(client.fetch_index().await.is_err());
}

use serde_json::{Value, json};
use std::time::Duration;
use twsearch_http::{Auth, HttpClient, HttpError, OAuth1Keys, RequestOpts};
use wiremock::matchers::{header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn keys() -> OAuth1Keys {
    OAuth1Keys {
        consumer_key: "ck".into(),
        consumer_secret: "cs".into(),
        token: "at".into(),
        token_secret: "ats".into(),
    }
}

#[tokio::test]
async fn signed_get_sends_query_and_authorization() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1.1/search/tweets.json"))
        .and(query_param("q", "rust lang"))
        .and(query_param("count", "10"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let keys = keys();
    let got: Value = client
        .get_json(
            "1.1/search/tweets.json",
            RequestOpts {
                auth: Some(Auth::OAuth1(&keys)),
                query: Some(vec![("q", "rust lang".into()), ("count", "10".into())]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(got, json!({ "ok": true }));

    let requests = server.received_requests().await.unwrap();
    let auth = requests[0].headers.get("authorization").unwrap().to_str().unwrap();
    assert!(auth.starts_with("OAuth "));
    assert!(auth.contains("oauth_consumer_key=\"ck\""));
    assert!(auth.contains("oauth_token=\"at\""));
    assert!(auth.contains("oauth_signature_method=\"HMAC-SHA1\""));
    assert!(!auth.contains("\"cs\"") && !auth.contains("\"ats\""));
}

#[tokio::test]
async fn error_status_maps_to_api_error_with_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "errors": [{ "code": 32, "message": "Could not authenticate you." }]
        })))
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let err = client
        .get_json::<Value>("x", RequestOpts::default())
        .await
        .unwrap_err();
    match err {
        HttpError::Api { status, message, .. } => {
            assert_eq!(status.as_u16(), 401);
            assert_eq!(message, "Could not authenticate you. (code 32)");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn non_json_success_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let err = client
        .get_json::<Value>("x", RequestOpts::default())
        .await
        .unwrap_err();
    match err {
        HttpError::Decode(_, snippet) => assert!(snippet.contains("maintenance")),
        other => panic!("expected Decode error, got {other:?}"),
    }
}

#[tokio::test]
async fn default_client_sends_a_failing_request_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).insert_header("retry-after", "0"))
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let err = client
        .get_json::<Value>("x", RequestOpts::default())
        .await
        .unwrap_err();
    assert!(matches!(err, HttpError::Api { status, .. } if status.as_u16() == 503));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn rate_limited_response_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "errors": [{ "code": 88, "message": "Rate limit exceeded" }]
        })))
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri())
        .unwrap()
        .with_timeout(Duration::from_secs(5));
    let err = client
        .get_json::<Value>("x", RequestOpts::default())
        .await
        .unwrap_err();
    match err {
        HttpError::Api { status, message, .. } => {
            assert_eq!(status.as_u16(), 429);
            assert_eq!(message, "Rate limit exceeded (code 88)");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

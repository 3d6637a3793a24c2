use std::time::Duration;

use serde_json::json;
use thalli_http::{HttpClient, HttpError, RequestOpts};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn get_text_returns_body_and_sends_user_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .and(header("user-agent", "thalli-test"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><p>hi</p></html>"))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::unanchored().unwrap().with_user_agent("thalli-test");
    let body = client
        .get_text(&format!("{}/page", server.uri()), RequestOpts::default())
        .await
        .unwrap();
    assert_eq!(body, "<html><p>hi</p></html>");
}

#[tokio::test]
async fn invalid_utf8_is_replaced_not_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![b'o', b'k', 0xFF]))
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let body = client.get_text("/", RequestOpts::default()).await.unwrap();
    assert_eq!(body, "ok\u{FFFD}");
}

#[tokio::test]
async fn server_errors_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string("recovered"))
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap().with_retries(1);
    let body = client.get_text("/flaky", RequestOpts::default()).await.unwrap();
    assert_eq!(body, "recovered");
}

#[tokio::test]
async fn client_errors_surface_status_and_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(404)
                .insert_header("x-request-id", "abc123")
                .set_body_json(json!({ "error": { "message": "no such page" } })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let err = client
        .get_text("/missing", RequestOpts::default())
        .await
        .unwrap_err();
    match err {
        HttpError::Api {
            status,
            message,
            request_id,
        } => {
            assert_eq!(status.as_u16(), 404);
            assert_eq!(message, "no such page");
            assert_eq!(request_id, "abc123");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn form_posts_are_urlencoded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/html/"))
        .and(body_string_contains("q=rust+kettles"))
        .respond_with(ResponseTemplate::new(200).set_body_string("results"))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let body = client
        .post_form_text("/html/", &[("q", "rust kettles")], RequestOpts::default())
        .await
        .unwrap();
    assert_eq!(body, "results");
}

#[tokio::test]
async fn post_json_decodes_typed_responses() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/echo"))
        .and(query_param("mode", "fast"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let opts = RequestOpts {
        auth: Some(thalli_http::Auth::Bearer("sk-test")),
        query: Some(vec![("mode", "fast".into())]),
        timeout: Some(Duration::from_secs(5)),
        ..Default::default()
    };
    let got: serde_json::Value = client
        .post_json_opts("/v1/echo", &json!({ "ping": 1 }), opts)
        .await
        .unwrap();
    assert_eq!(got["ok"], true);
}

#[tokio::test]
async fn undecodable_json_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let err = client
        .get_json::<serde_json::Value>("/", RequestOpts::default())
        .await
        .unwrap_err();
    assert!(matches!(err, HttpError::Decode(_, ref snippet) if snippet == "not json"));
}

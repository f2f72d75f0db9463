#![allow(clippy::unwrap_used)]
// Integration tests for `PanelClient` using wiremock.

use std::time::{Duration, Instant};

use secrecy::SecretString;
use wiremock::matchers::{body_string, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use woonveilig_api::{Credentials, Error, PanelClient, PanelMode, RequestRetry, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

// base64("admin:secret")
const AUTH_HEADER: &str = "Basic YWRtaW46c2VjcmV0";

fn transport(pause: Duration) -> TransportConfig {
    TransportConfig {
        retry: RequestRetry { attempts: 3, pause },
        ..TransportConfig::default()
    }
}

fn client_for(uri: String, pause: Duration) -> PanelClient {
    let credentials = Credentials::new(uri, "admin", SecretString::from("secret".to_owned()));
    PanelClient::new(credentials, &transport(pause)).unwrap()
}

async fn setup() -> (MockServer, PanelClient) {
    let server = MockServer::start().await;
    let client = client_for(server.uri(), Duration::ZERO);
    (server, client)
}

const HISTORY: &str = "/*-secure-\n{\thisrows : [\n    {d : \"10/14\", t : \"21:03\", a : \"Disarm\", s : \"Remote 1\"},\n    {d : \"10/14\", t : \"20:41\", a : \"Burglary\", s : \"PIR hallway\"}\n]\n}\n*/";

// ── Authentication tests ────────────────────────────────────────────

#[tokio::test]
async fn test_login_success() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/action/login"))
        .and(header("authorization", AUTH_HEADER))
        .respond_with(ResponseTemplate::new(200).set_body_string("whatever"))
        .expect(1)
        .mount(&server)
        .await;

    client.login().await.unwrap();
}

#[tokio::test]
async fn test_login_failure() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/action/login"))
        .respond_with(ResponseTemplate::new(401))
        .expect(3)
        .mount(&server)
        .await;

    let result = client.login().await;

    assert!(
        matches!(result, Err(Error::Authentication { status: 401 })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_requests_carry_panel_headers() {
    let (server, client) = setup().await;
    let origin = server.uri();
    let referer = format!("{}/setting/log.htm", server.uri());

    Mock::given(method("POST"))
        .and(path("/action/login"))
        .and(header_exists("accept"))
        .and(header_exists("accept-language"))
        .and(header("origin", origin.as_str()))
        .and(header("referer", referer.as_str()))
        .and(header("x-requested-with", "XMLHttpRequest"))
        .and(header(
            "user-agent",
            woonveilig_api::DEFAULT_USER_AGENT,
        ))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client.login().await.unwrap();
}

#[tokio::test]
async fn test_login_retries_spurious_401() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/action/login"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/action/login"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client.login().await.unwrap();
}

#[tokio::test]
async fn test_login_pauses_between_attempts() {
    let server = MockServer::start().await;
    let client = client_for(server.uri(), Duration::from_millis(50));

    Mock::given(method("POST"))
        .and(path("/action/login"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/action/login"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let start = Instant::now();
    client.login().await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(100));
}

// ── History tests ───────────────────────────────────────────────────

#[tokio::test]
async fn test_history_decodes_rows() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/action/historyGet"))
        .and(header("authorization", AUTH_HEADER))
        .respond_with(ResponseTemplate::new(200).set_body_string(HISTORY))
        .mount(&server)
        .await;

    let rows = client.history().await.unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].action, "Disarm");
    assert_eq!(rows[0].time, "21:03");
    assert_eq!(rows[1].action, "Burglary");
    assert_eq!(rows[1].source, "PIR hallway");
}

#[tokio::test]
async fn test_history_malformed_payload() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/action/historyGet"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let result = client.history().await;

    assert!(
        matches!(result, Err(Error::MalformedLog { .. })),
        "expected MalformedLog error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_history_server_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/action/historyGet"))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .expect(3)
        .mount(&server)
        .await;

    match client.history().await {
        Err(Error::HttpStatus { status, ref body }) => {
            assert_eq!(status, 503);
            assert_eq!(body, "busy");
        }
        other => panic!("expected HttpStatus error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_history_retries_transient_failures() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/action/historyGet"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/action/historyGet"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/action/historyGet"))
        .respond_with(ResponseTemplate::new(200).set_body_string(HISTORY))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(client.history().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_history_forbidden_is_not_retried() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/action/historyGet"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let result = client.history().await;

    assert!(
        matches!(result, Err(Error::Authentication { status: 403 })),
        "expected Authentication error, got: {result:?}"
    );
}

// ── Mode tests ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_set_mode_posts_wire_code() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/action/panelCondPost"))
        .and(header(
            "content-type",
            "application/x-www-form-urlencoded;charset=UTF-8",
        ))
        .and(body_string("mode=2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{ result : 1 }"))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client.set_mode(PanelMode::Disarm).await.unwrap());
}

#[tokio::test]
async fn test_set_mode_without_marker_is_rejected() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/action/panelCondPost"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{ result : 0 }"))
        .mount(&server)
        .await;

    assert!(!client.set_mode(PanelMode::Arm).await.unwrap());
}

#[tokio::test]
async fn test_set_mode_non_200_is_rejected() {
    let (server, client) = setup().await;

    // One attempt only: the command driver owns mode-change retries.
    Mock::given(method("POST"))
        .and(path("/action/panelCondPost"))
        .respond_with(ResponseTemplate::new(401).set_body_string("result : 1"))
        .expect(1)
        .mount(&server)
        .await;

    assert!(!client.set_mode(PanelMode::Home).await.unwrap());
}

#[tokio::test]
async fn test_unreachable_panel_is_transport_error() {
    // Bind and release a port so nothing is listening on it.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let uri = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let client = client_for(uri, Duration::ZERO);

    let result = client.fetch_history().await;
    match result {
        Err(ref e @ Error::Transport(_)) => assert!(e.is_transient()),
        other => panic!("expected Transport error, got: {other:?}"),
    }
}

//! End-to-end tests: a real `Client` (session manager over the HTTPS
//! transport) against a local scripted HTTP server.
//!
//! The server speaks just enough HTTP/1.1 for the client: each accepted
//! connection captures the raw request and answers with the next scripted
//! response (`Connection: close`, so one connection = one exchange).

use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use datagate::prelude::*;
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

// =========================================================================
// Helpers
// =========================================================================

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// A decodable bearer token issued now, valid for an hour.
fn issued_token(serial: usize) -> String {
    let claims = json!({ "iat": now(), "exp": now() + 3600, "serial": serial });
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap());
    format!("header.{payload}.signature")
}

fn grant_body(token: &str) -> String {
    json!({ "access_token": token, "token_type": "Bearer" }).to_string()
}

struct Scripted {
    status: u16,
    reason: &'static str,
    body: String,
}

impl Scripted {
    fn new(status: u16, reason: &'static str, body: impl Into<String>) -> Self {
        Self {
            status,
            reason,
            body: body.into(),
        }
    }
}

async fn spawn_server(
    responses: Vec<Scripted>,
) -> (String, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        for response in responses {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            let request = read_request(&mut stream).await;
            let _ = tx.send(request);

            let reply = format!(
                "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                response.status,
                response.reason,
                response.body.len(),
                response.body,
            );
            let _ = stream.write_all(reply.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });

    (format!("http://{addr}"), rx)
}

async fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let Ok(n) = stream.read(&mut chunk).await else {
            break;
        };
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(head_end) = find(&buf, b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..head_end]);
            let body_len = content_length(&head);
            if buf.len() >= head_end + 4 + body_len {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn content_length(head: &str) -> usize {
    head.lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            if name.eq_ignore_ascii_case("content-length") {
                value.trim().parse().ok()
            } else {
                None
            }
        })
        .unwrap_or(0)
}

fn drain(requests: &mut mpsc::UnboundedReceiver<String>) -> Vec<String> {
    let mut captured = Vec::new();
    while let Ok(request) = requests.try_recv() {
        captured.push(request);
    }
    captured
}

// =========================================================================
// Scenarios
// =========================================================================

#[tokio::test]
async fn test_client_full_lifecycle_against_device() {
    init_tracing();
    let token = issued_token(1);
    let (host, mut requests) = spawn_server(vec![
        Scripted::new(201, "Created", grant_body(&token)),
        Scripted::new(200, "OK", r#"{"value":5,"type":"int32"}"#),
        Scripted::new(204, "No Content", ""),
    ])
    .await;

    let client = ClientBuilder::new(&host, "operator", "secret")
        .build()
        .expect("client should build");

    // 1. Login: grant parsed, claims decoded, watermark computed.
    let receipt = client.login().await.expect("login should succeed");
    assert_eq!(receipt.access_token, token);
    assert_eq!(receipt.token_type, "Bearer");
    assert_eq!(receipt.renew_at, receipt.claims.iat + 3600 - 30);
    assert!(client.state().await.is_logged_in());

    // 2. Read: proxied once, result passed through unchanged.
    let value = client.read("a/b/c").await.expect("read should succeed");
    assert_eq!(value, json!({"value": 5, "type": "int32"}));

    // 3. Logout: local state cleared, token revoked remotely.
    client.logout().await.expect("logout should succeed");
    assert!(matches!(client.state().await, SessionState::LoggedOut));

    // 4. Reading again is a usage error and never reaches the wire.
    let result = client.read("a/b/c").await;
    assert!(matches!(result, Err(SessionError::NotLoggedIn)));

    let captured = drain(&mut requests);
    assert_eq!(captured.len(), 3, "exactly three exchanges hit the device");
    assert!(captured[0].starts_with("POST /identity-manager/api/v2/auth/token"));
    assert!(captured[1].starts_with("GET /automation/api/v2/nodes/a/b/c"));
    assert!(
        captured[1].contains(&format!("authorization: Bearer {token}")),
        "read must carry the issued token"
    );
    assert!(captured[2].starts_with("DELETE /identity-manager/api/v2/auth/token"));
}

#[tokio::test]
async fn test_client_reconnects_once_after_authorization_rejection() {
    init_tracing();
    let first = issued_token(1);
    let second = issued_token(2);
    let (host, mut requests) = spawn_server(vec![
        Scripted::new(201, "Created", grant_body(&first)),
        Scripted::new(
            401,
            "Unauthorized",
            r#"{"title":"Unauthorized","status":401,"detail":"token rejected"}"#,
        ),
        // The reconnect tears the old session down before re-authenticating.
        Scripted::new(204, "No Content", ""),
        Scripted::new(201, "Created", grant_body(&second)),
        Scripted::new(200, "OK", r#"{"value":7,"type":"int32"}"#),
    ])
    .await;

    let client = ClientBuilder::new(&host, "operator", "secret")
        .build()
        .expect("client should build");

    client.login().await.expect("login should succeed");
    let value = client
        .read("a/b/c")
        .await
        .expect("read should succeed after one transparent reconnect");
    assert_eq!(value, json!({"value": 7, "type": "int32"}));
    assert!(client.state().await.is_logged_in());

    let captured = drain(&mut requests);
    let lines: Vec<&str> = captured
        .iter()
        .map(|r| r.lines().next().unwrap_or(""))
        .collect();
    assert_eq!(captured.len(), 5);
    assert!(lines[0].starts_with("POST /identity-manager"));
    assert!(lines[1].starts_with("GET /automation"));
    assert!(lines[2].starts_with("DELETE /identity-manager"));
    assert!(lines[3].starts_with("POST /identity-manager"));
    assert!(lines[4].starts_with("GET /automation"));
    // The retry ran on the re-issued token, not the rejected one.
    assert!(captured[4].contains(&format!("authorization: Bearer {second}")));
}

#[tokio::test]
async fn test_client_without_auto_reconnect_surfaces_rejection() {
    init_tracing();
    let token = issued_token(1);
    let (host, mut requests) = spawn_server(vec![
        Scripted::new(201, "Created", grant_body(&token)),
        Scripted::new(
            401,
            "Unauthorized",
            r#"{"title":"Unauthorized","status":401}"#,
        ),
    ])
    .await;

    let client = ClientBuilder::new(&host, "operator", "secret")
        .auto_reconnect(false)
        .build()
        .expect("client should build");

    client.login().await.expect("login should succeed");
    let result = client.read("a/b/c").await;

    match result {
        Err(SessionError::Device(problem)) => {
            assert!(problem.is_unauthorized());
        }
        other => panic!("expected device rejection, got {other:?}"),
    }
    assert_eq!(drain(&mut requests).len(), 2, "no reconnect, no retry");
}

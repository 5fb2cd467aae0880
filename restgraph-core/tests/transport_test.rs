use restgraph_core::{HttpTransport, RequestOptions, Transport, TransportError};
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// Answers a single connection with `response` and hands back the raw request it received.
async fn serve_once(response: String) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        socket.write_all(response.as_bytes()).await.unwrap();
        let _ = socket.shutdown().await;
        request
    });

    (format!("http://{address}"), handle)
}

async fn read_request(socket: &mut TcpStream) -> String {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let read = socket.read(&mut chunk).await.unwrap();
        if read == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..read]);

        let text = String::from_utf8_lossy(&buffer);
        if let Some(end) = text.find("\r\n\r\n") {
            let length = text[..end]
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buffer.len() >= end + 4 + length {
                break;
            }
        }
    }
    String::from_utf8(buffer).unwrap()
}

fn reply(status: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\n\
         connection: close\r\n\r\n{body}",
        body.len()
    )
}

fn transport() -> HttpTransport {
    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    HttpTransport::new().with_client(client)
}

#[tokio::test]
async fn test_json_response_is_decoded() {
    let (base, server) = serve_once(reply("200 OK", r#"{"contents":[{"ref":"t:1"}]}"#)).await;

    let response = transport()
        .get(&format!("{base}/contents?owner=acme"), &RequestOptions::default())
        .await
        .unwrap();

    assert_eq!(response, json!({ "contents": [{ "ref": "t:1" }] }));
    let request = server.await.unwrap();
    assert!(request.starts_with("GET /contents?owner=acme HTTP/1.1"));
}

#[tokio::test]
async fn test_no_content_resolves_to_empty_object() {
    let (base, server) =
        serve_once("HTTP/1.1 204 No Content\r\nconnection: close\r\n\r\n".to_string()).await;

    let response = transport()
        .destroy(&format!("{base}/contents/acme:1"), &RequestOptions::default())
        .await
        .unwrap();

    assert_eq!(response, json!({}));
    assert!(server.await.unwrap().starts_with("DELETE /contents/acme:1 "));
}

#[tokio::test]
async fn test_empty_body_resolves_to_empty_object() {
    let (base, _server) = serve_once(reply("200 OK", "")).await;

    let response = transport()
        .put(&format!("{base}/contents/acme:1"), &RequestOptions::default())
        .await
        .unwrap();

    assert_eq!(response, json!({}));
}

#[tokio::test]
async fn test_error_status_keeps_the_body() {
    let (base, _server) = serve_once(reply(
        "422 Unprocessable Entity",
        r#"{"errors":[{"field":"name"}]}"#,
    ))
    .await;

    let err = transport()
        .post(&format!("{base}/contents"), &RequestOptions::default())
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(http::StatusCode::UNPROCESSABLE_ENTITY));
    match err {
        TransportError::Status { body, .. } => {
            assert_eq!(body, json!({ "errors": [{ "field": "name" }] }))
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_error_status_keeps_non_json_body_as_text() {
    let (base, _server) = serve_once(reply("503 Service Unavailable", "try later")).await;

    let err = transport()
        .get(&format!("{base}/contents"), &RequestOptions::default())
        .await
        .unwrap_err();

    match err {
        TransportError::Status { status, body, .. } => {
            assert_eq!(status, http::StatusCode::SERVICE_UNAVAILABLE);
            assert_eq!(body, Value::String("try later".to_string()));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_headers_and_body_are_sent() {
    let (base, server) = serve_once(reply("201 Created", r#"{"ref":"acme:intro"}"#)).await;

    let transport = transport()
        .with_header("authorization", "bearer token")
        .with_header("x-trace", "default");
    let options = RequestOptions::default()
        .with_header("x-trace", "request")
        .with_body(json!({ "name": "intro" }));

    let response = transport
        .post(&format!("{base}/contents"), &options)
        .await
        .unwrap();
    assert_eq!(response["ref"], "acme:intro");

    let request = server.await.unwrap().to_lowercase();
    assert!(request.starts_with("post /contents "));
    assert!(request.contains("authorization: bearer token\r\n"));
    // Per-request headers replace the defaults of the same name.
    assert!(request.contains("x-trace: request\r\n"));
    assert!(!request.contains("x-trace: default"));
    assert!(request.contains("content-type: application/json"));
    assert!(request.ends_with(r#"{"name":"intro"}"#));
}

#[tokio::test]
async fn test_invalid_header_is_rejected_before_sending() {
    let transport = transport().with_header("bad header", "value");

    let err = transport
        .get("http://127.0.0.1:9/contents", &RequestOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, TransportError::InvalidHeader(name, _) if name == "bad header"));
}

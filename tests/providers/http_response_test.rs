//! HTTP status checking and error body sanitization.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use taskdraft::providers::{check_http_response, sanitize_http_error_body, ProviderError};

async fn serve_once(status_line: &str, body: &str) -> String {
    let listener = match TcpListener::bind("127.0.0.1:0").await {
        Ok(listener) => listener,
        Err(err) => panic!("listener should bind: {err}"),
    };
    let addr = match listener.local_addr() {
        Ok(addr) => addr,
        Err(err) => panic!("listener should expose local addr: {err}"),
    };

    let status_line_owned = status_line.to_owned();
    let body_owned = body.to_owned();
    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            let mut read_buf = [0_u8; 1024];
            let _ = socket.read(&mut read_buf).await;

            let response = format!(
                "HTTP/1.1 {status_line_owned}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body_owned}",
                body_owned.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
        }
    });

    format!("http://{addr}/")
}

async fn fetch(url: String) -> reqwest::Response {
    match reqwest::get(url).await {
        Ok(response) => response,
        Err(err) => panic!("request should complete: {err}"),
    }
}

#[tokio::test]
async fn success_returns_body() {
    let url = serve_once("200 OK", "hello").await;
    let checked = check_http_response(fetch(url).await).await;
    assert!(matches!(checked.as_deref(), Ok("hello")));
}

#[tokio::test]
async fn non_success_is_http_status_error() {
    let url = serve_once("503 Service Unavailable", "model   loading\n\nplease wait").await;
    let checked = check_http_response(fetch(url).await).await;

    match checked {
        Err(ProviderError::HttpStatus { status, body }) => {
            assert_eq!(status, 503);
            assert_eq!(body, "model loading please wait");
        }
        Ok(body) => panic!("response should fail on non-success status, got {body}"),
        Err(other) => panic!("expected http status error, got: {other}"),
    }
}

#[tokio::test]
async fn long_error_body_is_truncated() {
    let url = serve_once("500 Internal Server Error", &"x".repeat(400)).await;
    let checked = check_http_response(fetch(url).await).await;

    match checked {
        Err(ProviderError::HttpStatus { body, .. }) => {
            assert!(body.ends_with("...[truncated]"));
            assert!(body.len() < 400);
        }
        other => panic!("expected http status error, got: {other:?}"),
    }
}

#[test]
fn sanitize_keeps_short_bodies() {
    assert_eq!(sanitize_http_error_body("  not\tfound  "), "not found");
}

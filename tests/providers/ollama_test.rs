//! Ollama client wire format and behaviour against a local stub server.

use std::time::Duration;

use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use taskdraft::providers::ollama::{
    build_request, model_is_available, parse_response, parse_tags, OllamaClient,
    DEFAULT_OLLAMA_URL,
};
use taskdraft::providers::{ModelRequest, ProviderError, ResponseFormat, TaskModelClient};

/// Serve one canned response and hand back the raw request text.
async fn serve_once(status_line: &str, body: &str) -> (String, oneshot::Receiver<String>) {
    let listener = match TcpListener::bind("127.0.0.1:0").await {
        Ok(listener) => listener,
        Err(err) => panic!("listener should bind: {err}"),
    };
    let addr = match listener.local_addr() {
        Ok(addr) => addr,
        Err(err) => panic!("listener should expose local addr: {err}"),
    };

    let (tx, rx) = oneshot::channel();
    let status_line_owned = status_line.to_owned();
    let body_owned = body.to_owned();
    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            let _ = tx.send(read_request(&mut socket).await);

            let response = format!(
                "HTTP/1.1 {status_line_owned}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body_owned}",
                body_owned.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
        }
    });

    (format!("http://{addr}"), rx)
}

/// Read headers plus a `Content-Length` body.
async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut raw = Vec::new();
    let mut chunk = [0_u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        raw.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&raw).into_owned();
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if raw.len() >= header_end.saturating_add(4).saturating_add(content_length) {
                break;
            }
        }
    }
    String::from_utf8_lossy(&raw).into_owned()
}

fn client(base_url: &str) -> OllamaClient {
    match OllamaClient::new(base_url, Duration::from_secs(5)) {
        Ok(client) => client,
        Err(err) => panic!("client should build: {err}"),
    }
}

fn request() -> ModelRequest {
    ModelRequest::structured("mistral", "Tow the car", "You are a task assistant.".to_owned())
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[test]
fn build_request_matches_generate_api() {
    let body = build_request(&request());
    let value = match serde_json::to_value(&body) {
        Ok(value) => value,
        Err(err) => panic!("request should serialise: {err}"),
    };
    assert_eq!(
        value,
        json!({
            "model": "mistral",
            "prompt": "Tow the car",
            "system": "You are a task assistant.",
            "stream": false,
            "format": "json"
        })
    );
}

#[test]
fn text_format_omits_format_field() {
    let mut req = request();
    req.format = ResponseFormat::Text;
    let value = serde_json::to_value(build_request(&req)).unwrap_or_default();
    assert!(value.get("format").is_none());
}

#[test]
fn parse_response_extracts_text() {
    let body = r#"{"model":"mistral","response":"{\"title\":\"A\"}","done":true}"#;
    assert!(matches!(parse_response(body).as_deref(), Ok(r#"{"title":"A"}"#)));
}

#[test]
fn parse_response_rejects_bad_envelope() {
    assert!(matches!(
        parse_response(r#"{"error":"boom"}"#),
        Err(ProviderError::Parse(_))
    ));
}

#[test]
fn tags_and_availability() {
    let body = r#"{"models":[{"name":"mistral:latest"},{"name":"llama3:8b"}]}"#;
    let models = match parse_tags(body) {
        Ok(models) => models,
        Err(err) => panic!("tags should parse: {err}"),
    };
    assert!(model_is_available(&models, "mistral"));
    assert!(model_is_available(&models, "llama3:8b"));
    assert!(!model_is_available(&models, "llama3"));
    assert!(!model_is_available(&models, "phi3"));
}

#[test]
fn default_url() {
    assert_eq!(DEFAULT_OLLAMA_URL, "http://localhost:11434");
    assert_eq!(client("http://localhost:11434/").base_url, DEFAULT_OLLAMA_URL);
}

// ---------------------------------------------------------------------------
// Against a stub server
// ---------------------------------------------------------------------------

#[tokio::test]
async fn generate_posts_to_api_generate() {
    let (url, seen) = serve_once(
        "200 OK",
        r#"{"model":"mistral","response":"{\"title\":\"Tow\"}","done":true}"#,
    )
    .await;

    let text = client(&url).generate(&request()).await;
    assert!(matches!(text.as_deref(), Ok(r#"{"title":"Tow"}"#)));

    let raw = seen.await.unwrap_or_default();
    assert!(raw.starts_with("POST /api/generate"));
    assert!(raw.contains("\"format\":\"json\""));
    assert!(raw.contains("\"stream\":false"));
}

#[tokio::test]
async fn missing_model_is_model_unavailable() {
    let (url, _seen) = serve_once("404 Not Found", r#"{"error":"model 'mistral' not found"}"#).await;
    let result = client(&url).generate(&request()).await;
    assert!(matches!(result, Err(ProviderError::ModelUnavailable(model)) if model == "mistral"));
}

#[tokio::test]
async fn server_error_is_http_status() {
    let (url, _seen) = serve_once("500 Internal Server Error", "{}").await;
    let result = client(&url).generate(&request()).await;
    assert!(matches!(result, Err(ProviderError::HttpStatus { status: 500, .. })));
}

#[tokio::test]
async fn unreachable_server_is_request_error() {
    let listener = match TcpListener::bind("127.0.0.1:0").await {
        Ok(listener) => listener,
        Err(err) => panic!("listener should bind: {err}"),
    };
    let addr = match listener.local_addr() {
        Ok(addr) => addr,
        Err(err) => panic!("listener should expose local addr: {err}"),
    };
    drop(listener);

    let result = client(&format!("http://{addr}")).generate(&request()).await;
    assert!(matches!(result, Err(ProviderError::Request(_))));
}

#[tokio::test]
async fn version_reads_api_version() {
    let (url, seen) = serve_once("200 OK", r#"{"version":"0.3.12"}"#).await;
    let version = client(&url).version().await;
    assert!(matches!(version.as_deref(), Ok("0.3.12")));
    assert!(seen.await.unwrap_or_default().starts_with("GET /api/version"));
}

#[tokio::test]
async fn list_models_reads_tags() {
    let (url, _seen) = serve_once("200 OK", r#"{"models":[{"name":"mistral:latest"}]}"#).await;
    let models = client(&url).list_models().await;
    assert!(matches!(models.as_deref(), Ok([name]) if name == "mistral:latest"));
}

//! # Tests Module
//!
//! Flow tests for the media upload, tweet post and publish orchestration.
//!
//! ## Test Categories
//!
//! ### Upload
//! - Missing files fail before any request
//! - Media id extraction from `media_id_string` and `media_id`
//! - Rejected and malformed upload responses
//!
//! ### Tweet
//! - Payload shape with and without media
//! - Rejected tweet responses
//!
//! ### Orchestration
//! - Text-only and text-with-image runs
//! - Short-circuit on upload failure and missing credentials
//!
//! ### Reqwest transport
//! - Headers, multipart field and status as seen by a local HTTP server
//!
//! ## Test Environment
//!
//! Flow tests go through `MockTransport`, which replays queued responses and
//! records every call. The reqwest transport tests talk to a one-shot server on
//! `127.0.0.1`. No test leaves the machine.

use std::collections::VecDeque;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_test::{assert_err, assert_ok};

use crate::config::{Credentials, Endpoints};
use crate::error::PublishError;
use crate::oauth::Signer;
use crate::publish::{PublishState, Publisher};
use crate::twitter::{
    parse_media_id, sanitize_for_logging, HttpResponse, MediaId, MediaPart, ReqwestTransport,
    Transport, TweetPayload, TwitterClient,
};

/// A request seen by the mock transport.
#[derive(Debug, Clone)]
enum RecordedCall {
    Multipart {
        url: String,
        authorization: String,
        part: MediaPart,
    },
    Json {
        url: String,
        authorization: String,
        body: String,
    },
}

impl RecordedCall {
    fn authorization(&self) -> &str {
        match self {
            RecordedCall::Multipart { authorization, .. } => authorization.as_str(),
            RecordedCall::Json { authorization, .. } => authorization.as_str(),
        }
    }
}

/// Replays queued responses in order and records every call.
#[derive(Default)]
struct MockTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, PublishError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockTransport {
    fn with_responses(responses: Vec<Result<HttpResponse, PublishError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    fn next_response(&self) -> Result<HttpResponse, PublishError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(PublishError::Transport("no response queued".to_string())))
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn post_multipart(
        &self,
        url: &str,
        authorization: &str,
        part: MediaPart,
    ) -> Result<HttpResponse, PublishError> {
        self.calls.lock().unwrap().push(RecordedCall::Multipart {
            url: url.to_string(),
            authorization: authorization.to_string(),
            part,
        });
        self.next_response()
    }

    async fn post_json(
        &self,
        url: &str,
        authorization: &str,
        json_body: &str,
    ) -> Result<HttpResponse, PublishError> {
        self.calls.lock().unwrap().push(RecordedCall::Json {
            url: url.to_string(),
            authorization: authorization.to_string(),
            body: json_body.to_string(),
        });
        self.next_response()
    }
}

fn test_credentials() -> Credentials {
    Credentials::new(
        "consumer-key",
        "consumer-secret",
        "access-token",
        "access-token-secret",
    )
}

fn test_client(transport: Arc<MockTransport>, credentials: Credentials) -> TwitterClient {
    TwitterClient::new(transport, Signer::new(credentials), Endpoints::default())
}

/// Writes a small fake PNG and keeps it alive for the test.
fn temp_image() -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("xpost-test-")
        .suffix(".png")
        .tempfile()
        .unwrap();
    file.write_all(b"\x89PNG\r\n\x1a\nfake image data").unwrap();
    file.flush().unwrap();
    file
}

fn json_body(call: &RecordedCall) -> Value {
    match call {
        RecordedCall::Json { body, .. } => serde_json::from_str(body).unwrap(),
        other => panic!("expected a JSON call, got {:?}", other),
    }
}

/// Uploading a missing file fails with FileNotFound and sends nothing.
#[tokio::test]
async fn test_upload_missing_file_makes_no_request() {
    let transport = MockTransport::with_responses(vec![]);
    let client = test_client(transport.clone(), test_credentials());

    let result = client
        .upload_media(Path::new("/definitely/not/here/image.png"))
        .await;

    match assert_err!(result) {
        PublishError::FileNotFound { path } => {
            assert_eq!(path, Path::new("/definitely/not/here/image.png"))
        }
        other => panic!("expected FileNotFound, got {:?}", other),
    }
    assert!(transport.calls().is_empty());
}

/// A directory is not an uploadable file.
#[tokio::test]
async fn test_upload_directory_is_not_found() {
    let transport = MockTransport::with_responses(vec![]);
    let client = test_client(transport.clone(), test_credentials());
    let dir = tempfile::tempdir().unwrap();

    let err = assert_err!(client.upload_media(dir.path()).await);
    assert_eq!(err.kind(), "FileNotFound");
    assert!(transport.calls().is_empty());
}

/// A successful upload sends the file under the `media` field to the upload endpoint.
#[tokio::test]
async fn test_upload_sends_multipart_media_field() {
    let transport = MockTransport::with_responses(vec![Ok(HttpResponse::new(
        200,
        r#"{"media_id":123,"media_id_string":"123"}"#,
    ))]);
    let client = test_client(transport.clone(), test_credentials());
    let image = temp_image();

    let media_id = assert_ok!(client.upload_media(image.path()).await);
    assert_eq!(media_id.as_str(), "123");

    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    match &calls[0] {
        RecordedCall::Multipart {
            url,
            authorization,
            part,
        } => {
            assert_eq!(url, "https://upload.twitter.com/1.1/media/upload.json");
            assert!(authorization.starts_with("OAuth "));
            assert!(authorization.contains("oauth_consumer_key=\"consumer-key\""));
            assert!(!authorization.contains("consumer-secret"));
            assert_eq!(part.field_name, "media");
            assert!(part.file_name.ends_with(".png"));
            assert_eq!(part.bytes, b"\x89PNG\r\n\x1a\nfake image data".to_vec());
        }
        other => panic!("expected a multipart call, got {:?}", other),
    }
}

/// A non-2xx upload carries the status and body.
#[tokio::test]
async fn test_upload_rejected() {
    let transport = MockTransport::with_responses(vec![Ok(HttpResponse::new(
        400,
        r#"{"errors":[{"message":"media type unrecognized"}]}"#,
    ))]);
    let client = test_client(transport, test_credentials());
    let image = temp_image();

    match assert_err!(client.upload_media(image.path()).await) {
        PublishError::UploadRejected { status, body } => {
            assert_eq!(status, 400);
            assert!(body.contains("media type unrecognized"));
        }
        other => panic!("expected UploadRejected, got {:?}", other),
    }
}

/// A 2xx upload with a non-JSON body is MalformedResponse.
#[tokio::test]
async fn test_upload_malformed_response() {
    let transport =
        MockTransport::with_responses(vec![Ok(HttpResponse::new(200, "<html>oops</html>"))]);
    let client = test_client(transport, test_credentials());
    let image = temp_image();

    let err = assert_err!(client.upload_media(image.path()).await);
    assert_eq!(err.kind(), "MalformedResponse");
}

#[test]
fn test_parse_media_id_variants() {
    assert_eq!(
        parse_media_id(r#"{"media_id_string":"123"}"#).unwrap(),
        MediaId::new("123")
    );
    assert_eq!(
        parse_media_id(r#"{"media_id":123}"#).unwrap(),
        MediaId::new("123")
    );
    // Quoted media_id is read as a string, not trimmed raw text
    assert_eq!(
        parse_media_id(r#"{"media_id":"456"}"#).unwrap(),
        MediaId::new("456")
    );
    // Large ids keep every digit
    assert_eq!(
        parse_media_id(r#"{"media_id":1890123456789012345}"#).unwrap(),
        MediaId::new("1890123456789012345")
    );
    assert_eq!(
        parse_media_id(r#"{"media_id":1,"media_id_string":"2"}"#).unwrap(),
        MediaId::new("2")
    );
}

#[test]
fn test_parse_media_id_errors() {
    match parse_media_id("{}") {
        Err(PublishError::UnexpectedResponse { body }) => assert_eq!(body, "{}"),
        other => panic!("expected UnexpectedResponse, got {:?}", other),
    }
    assert_eq!(
        parse_media_id(r#"{"media_id_string":""}"#).unwrap_err().kind(),
        "UnexpectedResponse"
    );
    assert_eq!(
        parse_media_id(r#"{"media_id":null}"#).unwrap_err().kind(),
        "UnexpectedResponse"
    );
    assert_eq!(
        parse_media_id("not json").unwrap_err().kind(),
        "MalformedResponse"
    );
}

#[test]
fn test_tweet_payload_shape() {
    let text_only = serde_json::to_value(TweetPayload::new("hello", &[])).unwrap();
    assert_eq!(text_only, serde_json::json!({"text": "hello"}));
    assert!(text_only.get("media").is_none());

    let with_media =
        serde_json::to_value(TweetPayload::new("hello", &[MediaId::new("42")])).unwrap();
    assert_eq!(
        with_media,
        serde_json::json!({"text": "hello", "media": {"media_ids": ["42"]}})
    );
}

/// Posting sends JSON to the tweet endpoint and returns the body verbatim.
#[tokio::test]
async fn test_post_tweet_returns_body_verbatim() {
    let response_body = r#"{"data":{"id":"1","text":"hello"}}"#;
    let transport =
        MockTransport::with_responses(vec![Ok(HttpResponse::new(201, response_body))]);
    let client = test_client(transport.clone(), test_credentials());

    let body = assert_ok!(client.post_tweet("hello", &[]).await);
    assert_eq!(body, response_body);

    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    match &calls[0] {
        RecordedCall::Json { url, .. } => assert_eq!(url, "https://api.twitter.com/2/tweets"),
        other => panic!("expected a JSON call, got {:?}", other),
    }
    assert_eq!(json_body(&calls[0]), serde_json::json!({"text": "hello"}));
}

/// A non-2xx tweet response carries the status and body.
#[tokio::test]
async fn test_post_tweet_rejected() {
    let transport = MockTransport::with_responses(vec![Ok(HttpResponse::new(
        403,
        r#"{"detail":"You are not permitted to perform this action."}"#,
    ))]);
    let client = test_client(transport, test_credentials());

    let err = assert_err!(client.post_tweet("hello", &[]).await);
    assert_eq!(err.status(), Some(403));
    match err {
        PublishError::PublishRejected { body, .. } => assert!(body.contains("not permitted")),
        other => panic!("expected PublishRejected, got {:?}", other),
    }
}

/// End-to-end: upload then publish, referencing the uploaded media id.
#[tokio::test]
async fn test_publish_with_image() {
    let transport = MockTransport::with_responses(vec![
        Ok(HttpResponse::new(201, r#"{"media_id_string":"999"}"#)),
        Ok(HttpResponse::new(
            201,
            r#"{"data":{"id":"1","text":"with image"}}"#,
        )),
    ]);
    let client = test_client(transport.clone(), test_credentials());
    let image = temp_image();

    let mut publisher = Publisher::new(&client);
    let body = assert_ok!(publisher.publish("with image", Some(image.path())).await);
    assert_eq!(body, r#"{"data":{"id":"1","text":"with image"}}"#);

    let calls = transport.calls();
    assert_eq!(calls.len(), 2);
    assert!(matches!(calls[0], RecordedCall::Multipart { .. }));
    let payload = json_body(&calls[1]);
    assert_eq!(payload["text"], "with image");
    assert_eq!(payload["media"]["media_ids"], serde_json::json!(["999"]));

    // Each request is signed with its own nonce
    assert_ne!(calls[0].authorization(), calls[1].authorization());

    assert_eq!(
        publisher.history(),
        &[
            PublishState::Idle,
            PublishState::Uploading,
            PublishState::Publishing,
            PublishState::Published
        ]
    );
}

/// A rejected upload stops the run before the tweet call.
#[tokio::test]
async fn test_publish_stops_after_upload_failure() {
    let transport = MockTransport::with_responses(vec![
        Ok(HttpResponse::new(401, r#"{"error":"invalid token"}"#)),
        Ok(HttpResponse::new(201, "{}")),
    ]);
    let client = test_client(transport.clone(), test_credentials());
    let image = temp_image();

    let mut publisher = Publisher::new(&client);
    let err = assert_err!(publisher.publish("hello", Some(image.path())).await);

    match err {
        PublishError::UploadRejected { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, r#"{"error":"invalid token"}"#);
        }
        other => panic!("expected UploadRejected, got {:?}", other),
    }
    assert_eq!(transport.calls().len(), 1);
    assert_eq!(publisher.state(), PublishState::Failed);
    assert!(!publisher.history().contains(&PublishState::Publishing));
}

/// A missing image stops the run with no requests at all.
#[tokio::test]
async fn test_publish_missing_image_makes_no_request() {
    let transport = MockTransport::with_responses(vec![]);
    let client = test_client(transport.clone(), test_credentials());

    let err = assert_err!(
        crate::publish(&client, "hello", Some(Path::new("/no/such/file.png"))).await
    );
    assert_eq!(err.kind(), "FileNotFound");
    assert!(transport.calls().is_empty());
}

/// Text-only runs make exactly one tweet call.
#[tokio::test]
async fn test_publish_text_only() {
    let transport = MockTransport::with_responses(vec![Ok(HttpResponse::new(
        201,
        r#"{"data":{"id":"7"}}"#,
    ))]);
    let client = test_client(transport.clone(), test_credentials());

    let mut publisher = Publisher::new(&client);
    let body = assert_ok!(publisher.publish_with(|| "composed".to_string(), None).await);
    assert_eq!(body, r#"{"data":{"id":"7"}}"#);

    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(json_body(&calls[0]), serde_json::json!({"text": "composed"}));
    assert_eq!(
        publisher.history(),
        &[PublishState::Idle, PublishState::Published]
    );
}

/// A rejected text-only post goes straight from Idle to Failed.
#[tokio::test]
async fn test_publish_text_only_rejected() {
    let transport = MockTransport::with_responses(vec![Ok(HttpResponse::new(
        403,
        r#"{"detail":"duplicate content"}"#,
    ))]);
    let client = test_client(transport.clone(), test_credentials());

    let mut publisher = Publisher::new(&client);
    let err = assert_err!(publisher.publish("hello", None).await);
    assert_eq!(err.kind(), "PublishRejected");
    assert_eq!(err.status(), Some(403));
    assert_eq!(transport.calls().len(), 1);
    assert_eq!(
        publisher.history(),
        &[PublishState::Idle, PublishState::Failed]
    );
}

/// Incomplete credentials are refused before any request.
#[tokio::test]
async fn test_publish_refuses_missing_credentials() {
    let transport = MockTransport::with_responses(vec![]);
    let client = test_client(
        transport.clone(),
        Credentials::new("consumer-key", "", "access-token", ""),
    );

    let err = assert_err!(crate::publish(&client, "hello", None).await);
    match err {
        PublishError::MissingCredentials { missing } => assert_eq!(
            missing,
            vec!["TWITTER_CONSUMER_SECRET", "TWITTER_ACCESS_TOKEN_SECRET"]
        ),
        other => panic!("expected MissingCredentials, got {:?}", other),
    }
    assert!(transport.calls().is_empty());
}

/// Network failures surface as TransportError and end the run.
#[tokio::test]
async fn test_publish_transport_error() {
    let transport = MockTransport::with_responses(vec![Err(PublishError::Transport(
        "connection refused".to_string(),
    ))]);
    let client = test_client(transport.clone(), test_credentials());

    let mut publisher = Publisher::new(&client);
    let err = assert_err!(publisher.publish("hello", None).await);
    assert_eq!(err.kind(), "TransportError");
    assert_eq!(publisher.state(), PublishState::Failed);
}

/// Error messages carry server detail but never credential values.
#[tokio::test]
async fn test_errors_do_not_leak_secrets() {
    let transport = MockTransport::with_responses(vec![Ok(HttpResponse::new(
        401,
        r#"{"title":"Unauthorized"}"#,
    ))]);
    let client = test_client(transport, test_credentials());

    let err = assert_err!(client.post_tweet("hello", &[]).await);
    let message = err.to_string();
    assert!(message.contains("401"));
    assert!(message.contains("Unauthorized"));
    assert!(!message.contains("consumer-secret"));
    assert!(!message.contains("access-token-secret"));
}

#[test]
fn test_sanitize_for_logging() {
    assert_eq!(sanitize_for_logging("line1\nline2\tx", 100), "line1 line2 x");
    assert_eq!(sanitize_for_logging("a\u{7}b", 100), "a?b");
    assert_eq!(
        sanitize_for_logging("abcdefghij", 4),
        "abcd... [truncated, 10 total bytes]"
    );
}

/// Accepts one connection, captures the raw request and answers with `status_line`.
async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        while !request_complete(&request) {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }

        let response = format!(
            concat!(
                "HTTP/1.1 {}\r\n",
                "content-type: application/json\r\n",
                "content-length: {}\r\n",
                "connection: close\r\n\r\n{}"
            ),
            status_line,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        String::from_utf8_lossy(&request).into_owned()
    });

    (base, handle)
}

/// True once the headers and the whole body (sized or chunked) have arrived.
fn request_complete(request: &[u8]) -> bool {
    let Some(end) = request.windows(4).position(|w| w == b"\r\n\r\n") else {
        return false;
    };
    let headers = String::from_utf8_lossy(&request[..end]).to_ascii_lowercase();
    let body = &request[end + 4..];

    if headers.contains("transfer-encoding: chunked") {
        return body.ends_with(b"0\r\n\r\n");
    }
    let length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    body.len() >= length
}

/// JSON posts carry the Authorization and Content-Type headers on the wire.
#[tokio::test]
async fn test_reqwest_transport_post_json() {
    let (base, server) = serve_once("201 Created", r#"{"data":{"id":"9"}}"#).await;
    let transport = ReqwestTransport::new();

    let response = assert_ok!(
        transport
            .post_json(
                &format!("{}/2/tweets", base),
                "OAuth oauth_consumer_key=\"ck\"",
                r#"{"text":"hello"}"#,
            )
            .await
    );
    assert_eq!(response, HttpResponse::new(201, r#"{"data":{"id":"9"}}"#));

    let request = server.await.unwrap();
    let lowered = request.to_ascii_lowercase();
    assert!(request.starts_with("POST /2/tweets HTTP/1.1\r\n"));
    assert!(lowered.contains("\r\ncontent-type: application/json\r\n"));
    assert!(request.contains("OAuth oauth_consumer_key=\"ck\""));
    assert!(request.ends_with(r#"{"text":"hello"}"#));
}

/// Uploads send the bytes as a named multipart file field.
#[tokio::test]
async fn test_reqwest_transport_post_multipart() {
    let (base, server) = serve_once("200 OK", r#"{"media_id_string":"5"}"#).await;
    let transport = ReqwestTransport::new();
    let part = MediaPart {
        field_name: "media".to_string(),
        file_name: "cat.png".to_string(),
        bytes: b"not-really-a-png".to_vec(),
    };

    let response = assert_ok!(
        transport
            .post_multipart(
                &format!("{}/1.1/media/upload.json", base),
                "OAuth oauth_token=\"at\"",
                part,
            )
            .await
    );
    assert_eq!(response.status, 200);
    assert_eq!(response.body, r#"{"media_id_string":"5"}"#);

    let request = server.await.unwrap();
    let lowered = request.to_ascii_lowercase();
    assert!(request.starts_with("POST /1.1/media/upload.json HTTP/1.1\r\n"));
    assert!(lowered.contains("content-type: multipart/form-data; boundary="));
    assert!(request.contains("OAuth oauth_token=\"at\""));
    assert!(request.contains("name=\"media\"; filename=\"cat.png\""));
    assert!(request.contains("not-really-a-png"));
}

/// Non-2xx statuses come back as responses, not transport errors.
#[tokio::test]
async fn test_reqwest_transport_passes_error_status_through() {
    let (base, server) = serve_once("401 Unauthorized", r#"{"title":"Unauthorized"}"#).await;

    let response = assert_ok!(
        ReqwestTransport::new()
            .post_json(&format!("{}/2/tweets", base), "OAuth x", "{}")
            .await
    );
    assert_eq!(response.status, 401);
    assert!(!response.is_success());
    assert_eq!(response.body, r#"{"title":"Unauthorized"}"#);
    server.await.unwrap();
}

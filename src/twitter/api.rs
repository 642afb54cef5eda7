//! Core Twitter API utilities.
//!
//! This module contains the HTTP transport seam used by the upload and tweet
//! calls, the reqwest-backed implementation, and log sanitizing helpers.

use async_trait::async_trait;
use log::{debug, info};
use reqwest::multipart::{Form, Part};
use reqwest::Client;

use crate::error::PublishError;

/// Status and body of an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// True for statuses in `[200, 300)`.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A binary file sent as one multipart form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPart {
    pub field_name: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Sends the signed requests.
///
/// The transport never looks at the `Authorization` value beyond attaching it,
/// and never retries.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POSTs a multipart body containing `part`.
    async fn post_multipart(
        &self,
        url: &str,
        authorization: &str,
        part: MediaPart,
    ) -> Result<HttpResponse, PublishError>;

    /// POSTs `json_body` with `Content-Type: application/json`.
    async fn post_json(
        &self,
        url: &str,
        authorization: &str,
        json_body: &str,
    ) -> Result<HttpResponse, PublishError>;
}

/// [`Transport`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post_multipart(
        &self,
        url: &str,
        authorization: &str,
        part: MediaPart,
    ) -> Result<HttpResponse, PublishError> {
        info!("Sending multipart POST request to {}", url);
        debug!(
            "Multipart field '{}' with file '{}' ({} bytes)",
            part.field_name,
            part.file_name,
            part.bytes.len()
        );
        debug!("Request headers: Authorization: OAuth [REDACTED]");

        let form = Form::new().part(
            part.field_name,
            Part::bytes(part.bytes).file_name(part.file_name),
        );

        let response = self
            .client
            .post(url)
            .header("Authorization", authorization)
            .multipart(form)
            .send()
            .await?;

        read_response(response).await
    }

    async fn post_json(
        &self,
        url: &str,
        authorization: &str,
        json_body: &str,
    ) -> Result<HttpResponse, PublishError> {
        info!("Sending JSON POST request to {}", url);
        debug!("Request headers: Authorization: OAuth [REDACTED], Content-Type: application/json");

        let response = self
            .client
            .post(url)
            .header("Authorization", authorization)
            .header("Content-Type", "application/json")
            .body(json_body.to_string())
            .send()
            .await?;

        read_response(response).await
    }
}

async fn read_response(response: reqwest::Response) -> Result<HttpResponse, PublishError> {
    let status = response.status().as_u16();
    info!("Received response with status: {}", status);
    let body = response.text().await?;
    debug!("Response summary: {} bytes received", body.len());
    Ok(HttpResponse { status, body })
}

/// Sanitizes text for safe logging by truncating and escaping control characters.
///
/// This function:
/// - Truncates long text to prevent log flooding
/// - Replaces control characters that could manipulate log output
/// - Escapes newlines to prevent log injection
///
/// # Parameters
///
/// - `text`: The text to sanitize
/// - `max_len`: Maximum length in characters before truncation
///
/// # Returns
///
/// A sanitized string safe for logging
pub(crate) fn sanitize_for_logging(text: &str, max_len: usize) -> String {
    let sanitized: String = text
        .chars()
        .map(|c| match c {
            '\n' | '\r' | '\t' => ' ',
            c if c.is_control() => '?',
            c => c,
        })
        .collect();

    if sanitized.chars().count() > max_len {
        let truncated: String = sanitized.chars().take(max_len).collect();
        format!(
            "{}... [truncated, {} total bytes]",
            truncated,
            text.len()
        )
    } else {
        sanitized
    }
}

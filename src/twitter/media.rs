//! Media upload for Twitter API.
//!
//! Images are sent to the v1.1 upload endpoint as `multipart/form-data` under
//! the `media` field. The multipart body is not part of the OAuth signature.

use std::fmt;
use std::path::Path;

use log::{debug, error, info};
use serde::Serialize;
use serde_json::Value;

use crate::error::PublishError;
use crate::oauth::SignatureRequest;

use super::api::{sanitize_for_logging, MediaPart};
use super::client::TwitterClient;

/// Multipart field name expected by the upload endpoint.
pub const MEDIA_FIELD_NAME: &str = "media";

/// Server-assigned identifier of an uploaded media file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MediaId(String);

impl MediaId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extracts the media identifier from an upload response body.
///
/// `media_id_string` is preferred. `media_id` is accepted as a JSON number
/// (converted to its decimal form) or as a quoted string.
///
/// # Errors
///
/// - `MalformedResponse`: The body is not JSON
/// - `UnexpectedResponse`: Neither field holds a non-empty identifier
pub fn parse_media_id(body: &str) -> Result<MediaId, PublishError> {
    let json: Value =
        serde_json::from_str(body).map_err(|source| PublishError::MalformedResponse {
            body: body.to_string(),
            source,
        })?;

    let id = match json.get("media_id_string") {
        Some(Value::String(s)) => Some(s.clone()),
        _ => match json.get("media_id") {
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::String(s)) => Some(s.clone()),
            _ => None,
        },
    };

    match id {
        Some(id) if !id.trim().is_empty() => Ok(MediaId(id)),
        _ => Err(PublishError::UnexpectedResponse {
            body: body.to_string(),
        }),
    }
}

impl TwitterClient {
    /// Uploads a local image and returns its media identifier.
    ///
    /// # Parameters
    ///
    /// - `path`: Path of the image to upload
    ///
    /// # Returns
    ///
    /// - `Ok(MediaId)`: The identifier to reference from a tweet
    /// - `Err(PublishError)`: `FileNotFound` (no request is sent), `Io`,
    ///   `UploadRejected`, `MalformedResponse`, `UnexpectedResponse` or `Transport`
    pub async fn upload_media(&self, path: &Path) -> Result<MediaId, PublishError> {
        info!("Starting media upload from: {}", path.display());

        let is_file = match tokio::fs::metadata(path).await {
            Ok(metadata) => metadata.is_file(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(source) => {
                return Err(PublishError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        if !is_file {
            error!("Image not found at path: {}", path.display());
            return Err(PublishError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| PublishError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| MEDIA_FIELD_NAME.to_string());
        debug!("Read {} bytes from {}", bytes.len(), file_name);

        let url = &self.endpoints.upload_url;
        let auth_header = self.signer.sign(&SignatureRequest::new("POST", url.as_str()));

        let response = self
            .transport
            .post_multipart(
                url,
                &auth_header,
                MediaPart {
                    field_name: MEDIA_FIELD_NAME.to_string(),
                    file_name,
                    bytes,
                },
            )
            .await?;

        if !response.is_success() {
            error!("Media upload failed. HTTP {}", response.status);
            debug!(
                "Error response for media upload: {}",
                sanitize_for_logging(&response.body, 200)
            );
            return Err(PublishError::UploadRejected {
                status: response.status,
                body: response.body,
            });
        }

        let media_id = parse_media_id(&response.body).map_err(|e| {
            error!("Could not read media id from upload response: {}", e.kind());
            e
        })?;
        info!("Media uploaded successfully, media_id: {}", media_id);
        Ok(media_id)
    }
}

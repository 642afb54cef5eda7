//! Error types for the publish flow.
//!
//! Every variant is terminal for the current run: nothing in this crate retries.
//! Messages carry the HTTP status and raw server body where one exists, and never
//! include credential values.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while uploading media or publishing a tweet.
#[derive(Debug, Error)]
pub enum PublishError {
    /// One or more of the four OAuth 1.0a credential fields is empty.
    #[error("missing Twitter credentials: {}", missing.join(", "))]
    MissingCredentials { missing: Vec<&'static str> },

    /// The image path does not point at an existing file.
    #[error("media file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// The image exists but could not be read.
    #[error("failed to read media file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The upload endpoint answered with a non-2xx status.
    #[error("media upload rejected (HTTP {status}): {body}")]
    UploadRejected { status: u16, body: String },

    /// The tweet endpoint answered with a non-2xx status.
    #[error("tweet post rejected (HTTP {status}): {body}")]
    PublishRejected { status: u16, body: String },

    /// The response body is not valid JSON.
    #[error("response is not valid JSON: {source}; body: {body}")]
    MalformedResponse {
        body: String,
        #[source]
        source: serde_json::Error,
    },

    /// The response is JSON but lacks a usable media identifier.
    #[error("media upload response did not contain media_id_string or media_id: {body}")]
    UnexpectedResponse { body: String },

    /// The tweet payload could not be serialized.
    #[error("failed to encode tweet payload: {0}")]
    Encode(#[source] serde_json::Error),

    /// The endpoint could not be reached.
    #[error("transport error: {0}")]
    Transport(String),
}

impl PublishError {
    /// Stable name of the error kind, printed by the CLI.
    pub fn kind(&self) -> &'static str {
        match self {
            PublishError::MissingCredentials { .. } => "MissingCredentials",
            PublishError::FileNotFound { .. } => "FileNotFound",
            PublishError::Io { .. } => "Io",
            PublishError::UploadRejected { .. } => "UploadRejected",
            PublishError::PublishRejected { .. } => "PublishRejected",
            PublishError::MalformedResponse { .. } => "MalformedResponse",
            PublishError::UnexpectedResponse { .. } => "UnexpectedResponse",
            PublishError::Encode(_) => "Encode",
            PublishError::Transport(_) => "TransportError",
        }
    }

    /// HTTP status attached to rejected requests.
    pub fn status(&self) -> Option<u16> {
        match self {
            PublishError::UploadRejected { status, .. }
            | PublishError::PublishRejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for PublishError {
    fn from(e: reqwest::Error) -> Self {
        // Strip the URL so that nothing request-specific leaks into the message
        PublishError::Transport(e.without_url().to_string())
    }
}

/// Errors produced while composing the message text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MessageError {
    #[error("tweet message cannot be empty")]
    Empty,
    #[error("tweet is too long: {length} characters (max {max})")]
    TooLong { length: usize, max: usize },
}

//! # xpost Library
//!
//! Publishes text and image posts to Twitter/X using OAuth 1.0a User Context
//! request signing. A run either posts text alone, or uploads an image first and
//! then posts text that references the uploaded media.
//!
//! ## Features
//!
//! - OAuth 1.0a HMAC-SHA1 `Authorization` headers with masked debug diagnostics
//! - Multipart media upload to the v1.1 upload endpoint
//! - Tweet creation through the v2 endpoint
//! - A pluggable HTTP [`Transport`](twitter::Transport) for testing
//! - Reminder message composition with a days-since counter
//!
//! ## Configuration
//!
//! - `TWITTER_CONSUMER_KEY`, `TWITTER_CONSUMER_SECRET`: Application key pair
//! - `TWITTER_ACCESS_TOKEN`, `TWITTER_ACCESS_TOKEN_SECRET`: User access token pair
//! - `TWITTER_DEBUG`: Set to `1` to log masked OAuth signing diagnostics
//! - `TWITTER_UPLOAD_URL`, `TWITTER_TWEET_URL`: Endpoint overrides

pub mod config;
pub mod error;
pub mod message;
pub mod oauth;
pub mod publish;
pub mod twitter;

// Re-export commonly used types and functions
pub use config::{AppConfig, Credentials, Endpoints};
pub use error::{MessageError, PublishError};
pub use oauth::{DiagnosticSink, LogSink, SignatureRequest, Signer};
pub use publish::{publish, PublishState, Publisher};
pub use twitter::{MediaId, TwitterClient};

#[cfg(test)]
mod tests;

//! Twitter/X API integration module.
//!
//! This module contains the OAuth 1.0a signed calls to the Twitter/X API:
//! media upload through the v1.1 endpoint and tweet creation through v2.

mod api;
mod client;
mod media;
mod tweets;

// Re-export public API
pub use api::{HttpResponse, MediaPart, ReqwestTransport, Transport};
pub use client::TwitterClient;
pub use media::{parse_media_id, MediaId, MEDIA_FIELD_NAME};
pub use tweets::{TweetMedia, TweetPayload};

// Crate-internal re-exports (used by tests and other modules)
#[allow(unused_imports)]
pub(crate) use api::sanitize_for_logging;

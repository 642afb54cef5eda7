//! Tweet operations for Twitter API.
//!
//! This module contains the payload type and the call that creates a tweet
//! through the v2 endpoint, optionally referencing uploaded media.

use log::{debug, error, info};
use serde::Serialize;

use crate::error::PublishError;
use crate::oauth::SignatureRequest;

use super::api::sanitize_for_logging;
use super::client::TwitterClient;
use super::media::MediaId;

/// JSON body of a create-tweet request.
///
/// The `media` key is omitted entirely when there is nothing to attach.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TweetPayload {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<TweetMedia>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TweetMedia {
    pub media_ids: Vec<MediaId>,
}

impl TweetPayload {
    pub fn new(text: impl Into<String>, media_ids: &[MediaId]) -> Self {
        let media = if media_ids.is_empty() {
            None
        } else {
            Some(TweetMedia {
                media_ids: media_ids.to_vec(),
            })
        };
        Self {
            text: text.into(),
            media,
        }
    }
}

impl TwitterClient {
    /// Posts a tweet to Twitter/X using the API v2 endpoint.
    ///
    /// The request is signed with OAuth 1.0a. The JSON body is not covered by
    /// the signature.
    ///
    /// # Parameters
    ///
    /// - `text`: The text content of the tweet to post
    /// - `media_ids`: Uploaded media to attach, may be empty
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The API response body, verbatim
    /// - `Err(PublishError)`: `PublishRejected` for non-2xx statuses, or `Transport`
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use xpost::config::AppConfig;
    /// use xpost::twitter::TwitterClient;
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     let client = TwitterClient::from_config(&AppConfig::from_env());
    ///     match client.post_tweet("Hello from Rust!", &[]).await {
    ///         Ok(response) => println!("Tweet posted: {}", response),
    ///         Err(e) => eprintln!("Failed to post tweet: {}", e),
    ///     }
    /// }
    /// ```
    pub async fn post_tweet(
        &self,
        text: &str,
        media_ids: &[MediaId],
    ) -> Result<String, PublishError> {
        info!(
            "Starting tweet post operation for text: '{}'",
            sanitize_for_logging(text, 80)
        );

        let url = &self.endpoints.tweet_url;
        info!("Target URL: {}", url);

        let payload = TweetPayload::new(text, media_ids);
        let body = serde_json::to_string(&payload).map_err(PublishError::Encode)?;
        debug!("Tweet payload: {}", body);

        debug!("Building OAuth 1.0a authorization header");
        let auth_header = self.signer.sign(&SignatureRequest::new("POST", url.as_str()));

        let response = self.transport.post_json(url, &auth_header, &body).await?;

        if !response.is_success() {
            error!("Tweet post failed. HTTP {}", response.status);
            debug!(
                "Error response for tweet post: {}",
                sanitize_for_logging(&response.body, 200)
            );
            return Err(PublishError::PublishRejected {
                status: response.status,
                body: response.body,
            });
        }

        info!("Tweet posted successfully");
        Ok(response.body)
    }
}

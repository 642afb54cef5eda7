//! Publish orchestration.
//!
//! A run is either text-only (one tweet call) or text-with-image (upload, then
//! tweet referencing the upload). The first failure ends the run; nothing is
//! retried.

use std::fmt;
use std::path::Path;

use log::{error, info};

use crate::error::PublishError;
use crate::twitter::{MediaId, TwitterClient};

/// Stages of a publish run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishState {
    Idle,
    Uploading,
    Publishing,
    Published,
    Failed,
}

impl fmt::Display for PublishState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PublishState::Idle => "idle",
            PublishState::Uploading => "uploading",
            PublishState::Publishing => "publishing",
            PublishState::Published => "published",
            PublishState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Drives one publish run and records the stages it went through.
#[derive(Debug)]
pub struct Publisher<'a> {
    client: &'a TwitterClient,
    history: Vec<PublishState>,
}

impl<'a> Publisher<'a> {
    pub fn new(client: &'a TwitterClient) -> Self {
        Self {
            client,
            history: vec![PublishState::Idle],
        }
    }

    /// Current stage.
    pub fn state(&self) -> PublishState {
        self.history
            .last()
            .copied()
            .unwrap_or(PublishState::Idle)
    }

    /// Every stage entered so far, starting with `Idle`.
    pub fn history(&self) -> &[PublishState] {
        &self.history
    }

    fn transition(&mut self, next: PublishState) {
        info!("Publish state: {} -> {}", self.state(), next);
        self.history.push(next);
    }

    fn fail(&mut self, e: PublishError) -> PublishError {
        error!("Publish run failed with {}: {}", e.kind(), e);
        self.transition(PublishState::Failed);
        e
    }

    /// Publishes `text`, uploading `image` first when one is given.
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The raw tweet response body
    /// - `Err(PublishError)`: The first error encountered; later steps are skipped
    pub async fn publish(
        &mut self,
        text: &str,
        image: Option<&Path>,
    ) -> Result<String, PublishError> {
        if let Err(e) = self.client.signer().credentials().validate() {
            return Err(self.fail(e));
        }

        let media_ids: Vec<MediaId> = match image {
            Some(path) => {
                self.transition(PublishState::Uploading);
                match self.client.upload_media(path).await {
                    Ok(id) => {
                        self.transition(PublishState::Publishing);
                        vec![id]
                    }
                    Err(e) => return Err(self.fail(e)),
                }
            }
            None => Vec::new(),
        };

        match self.client.post_tweet(text, &media_ids).await {
            Ok(body) => {
                self.transition(PublishState::Published);
                Ok(body)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Same as [`Publisher::publish`], with the text produced by `compose`.
    pub async fn publish_with<F>(
        &mut self,
        compose: F,
        image: Option<&Path>,
    ) -> Result<String, PublishError>
    where
        F: FnOnce() -> String,
    {
        let text = compose();
        self.publish(&text, image).await
    }
}

/// Runs a single publish with a fresh [`Publisher`].
pub async fn publish(
    client: &TwitterClient,
    text: &str,
    image: Option<&Path>,
) -> Result<String, PublishError> {
    Publisher::new(client).publish(text, image).await
}

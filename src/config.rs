//! Configuration module for the xpost tool.
//!
//! This module contains the credential and endpoint structures and the environment
//! variable handling for the Twitter/X API integration. Everything here is read
//! once at startup and then passed explicitly to the signer and the HTTP calls.

use log::{debug, info, warn};
use std::env;
use std::fmt;

use crate::error::PublishError;
use crate::oauth::mask_secret;

/// Default endpoint for the v1.1 media upload API.
pub const DEFAULT_UPLOAD_URL: &str = "https://upload.twitter.com/1.1/media/upload.json";

/// Default endpoint for the v2 create-tweet API.
pub const DEFAULT_TWEET_URL: &str = "https://api.twitter.com/2/tweets";

/// OAuth 1.0a User Context credentials.
///
/// All four values come from the Twitter Developer Portal (consumer key pair) and
/// the user's access token pair. They are immutable once loaded. Missing values are
/// kept as empty strings so that the signer stays total; [`Credentials::validate`]
/// is what refuses to publish with an incomplete set.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &mask_secret(&self.consumer_key))
            .field("consumer_secret", &mask_secret(&self.consumer_secret))
            .field("access_token", &mask_secret(&self.access_token))
            .field("access_token_secret", &mask_secret(&self.access_token_secret))
            .finish()
    }
}

impl Credentials {
    pub fn new(
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        access_token: impl Into<String>,
        access_token_secret: impl Into<String>,
    ) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            access_token: access_token.into(),
            access_token_secret: access_token_secret.into(),
        }
    }

    /// Loads the credentials from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `TWITTER_CONSUMER_KEY`
    /// - `TWITTER_CONSUMER_SECRET`
    /// - `TWITTER_ACCESS_TOKEN`
    /// - `TWITTER_ACCESS_TOKEN_SECRET`
    ///
    /// Unset variables become empty strings and are reported by [`Credentials::validate`].
    pub fn from_env() -> Self {
        info!("Loading Twitter OAuth 1.0a credentials from environment variables");
        Self {
            consumer_key: read_secret_var("TWITTER_CONSUMER_KEY"),
            consumer_secret: read_secret_var("TWITTER_CONSUMER_SECRET"),
            access_token: read_secret_var("TWITTER_ACCESS_TOKEN"),
            access_token_secret: read_secret_var("TWITTER_ACCESS_TOKEN_SECRET"),
        }
    }

    /// Names of the credential variables that are empty or whitespace-only.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("TWITTER_CONSUMER_KEY", &self.consumer_key),
            ("TWITTER_CONSUMER_SECRET", &self.consumer_secret),
            ("TWITTER_ACCESS_TOKEN", &self.access_token),
            ("TWITTER_ACCESS_TOKEN_SECRET", &self.access_token_secret),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    /// Checks that all four fields are present.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: If every field is non-empty
    /// - `Err(PublishError::MissingCredentials)`: Listing the missing variable names
    pub fn validate(&self) -> Result<(), PublishError> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(PublishError::MissingCredentials { missing })
        }
    }
}

/// Reads a secret from the environment, logging only its masked form.
fn read_secret_var(name: &str) -> String {
    match env::var(name) {
        Ok(value) => {
            info!(
                "Found {} environment variable with length: {}",
                name,
                value.len()
            );
            debug!("{} (masked): {}", name, mask_secret(&value));
            value
        }
        Err(_) => {
            warn!("No {} found in environment variables", name);
            String::new()
        }
    }
}

/// The two API endpoints used by a publish run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub upload_url: String,
    pub tweet_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            upload_url: DEFAULT_UPLOAD_URL.to_string(),
            tweet_url: DEFAULT_TWEET_URL.to_string(),
        }
    }
}

impl Endpoints {
    /// Loads the endpoints, honouring `TWITTER_UPLOAD_URL` and `TWITTER_TWEET_URL` overrides.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let upload_url = env::var("TWITTER_UPLOAD_URL").unwrap_or(defaults.upload_url);
        let tweet_url = env::var("TWITTER_TWEET_URL").unwrap_or(defaults.tweet_url);
        debug!("Upload endpoint: {}", upload_url);
        debug!("Tweet endpoint: {}", tweet_url);
        Self {
            upload_url,
            tweet_url,
        }
    }
}

/// Complete process configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub credentials: Credentials,
    pub endpoints: Endpoints,
    /// Emit masked OAuth signing diagnostics.
    pub debug: bool,
}

impl AppConfig {
    /// Loads the full configuration from the environment.
    ///
    /// `TWITTER_DEBUG` set to `1` or `true` turns on signer diagnostics.
    pub fn from_env() -> Self {
        let config = Self {
            credentials: Credentials::from_env(),
            endpoints: Endpoints::from_env(),
            debug: debug_flag_from_env(),
        };
        info!("Configuration loaded successfully");
        if config.debug {
            info!("OAuth debug diagnostics are enabled");
        }
        config
    }
}

/// Parses the `TWITTER_DEBUG` toggle.
pub fn debug_flag_from_env() -> bool {
    env::var("TWITTER_DEBUG")
        .map(|v| parse_bool_flag(&v))
        .unwrap_or(false)
}

pub(crate) fn parse_bool_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

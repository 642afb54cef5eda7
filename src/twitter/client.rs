//! The authenticated client shared by the upload and tweet calls.

use std::sync::Arc;

use crate::config::{AppConfig, Endpoints};
use crate::oauth::Signer;

use super::api::{ReqwestTransport, Transport};

/// Bundles the transport, the signer and the endpoint URLs.
///
/// Every request made through the client is signed separately, so each one gets
/// its own nonce and timestamp.
#[derive(Clone)]
pub struct TwitterClient {
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) signer: Signer,
    pub(crate) endpoints: Endpoints,
}

impl TwitterClient {
    pub fn new(transport: Arc<dyn Transport>, signer: Signer, endpoints: Endpoints) -> Self {
        Self {
            transport,
            signer,
            endpoints,
        }
    }

    /// Builds a reqwest-backed client from the loaded configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        let signer = Signer::new(config.credentials.clone()).with_debug(config.debug);
        Self::new(
            Arc::new(ReqwestTransport::new()),
            signer,
            config.endpoints.clone(),
        )
    }

    pub fn signer(&self) -> &Signer {
        &self.signer
    }
}

impl std::fmt::Debug for TwitterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwitterClient")
            .field("signer", &self.signer)
            .field("endpoints", &self.endpoints)
            .finish()
    }
}

pub mod image_client;
pub mod transport;

use crate::{
    broker::{ApiKeySource, CredentialBroker, SharedApiKey},
    config::StudioConfig,
    error::{Result, StudioError},
};
use std::sync::Arc;

pub use image_client::ImageClient;
pub use transport::{DispatchError, HttpTransport, ImageTransport};

#[derive(Clone)]
pub struct GeminiClient {
    image_client: ImageClient,
    keys: SharedApiKey,
}

impl GeminiClient {
    /// Builds an HTTP-backed client. The API key is resolved per request
    /// from a [`SharedApiKey`] seeded with `config.api_key`.
    pub fn new(config: &StudioConfig) -> Result<Self> {
        if config.api_base.trim().is_empty() {
            return Err(StudioError::Config("Gemini API base URL is empty".into()));
        }
        if config.flash_model.trim().is_empty() || config.pro_model.trim().is_empty() {
            return Err(StudioError::Config("Model identifiers must not be empty".into()));
        }

        let keys = SharedApiKey::new(config.api_key.clone());
        let source: Arc<dyn ApiKeySource> = Arc::new(keys.clone());
        let transport = Arc::new(HttpTransport::new(config.api_base.clone(), source));

        Ok(Self {
            image_client: ImageClient::new(transport, config),
            keys,
        })
    }

    pub fn with_broker(mut self, broker: Arc<dyn CredentialBroker>) -> Self {
        self.image_client = self.image_client.with_broker(broker);
        self
    }

    pub fn image(&self) -> &ImageClient {
        &self.image_client
    }

    /// Key slot the transport reads from; hand it to a broker so keys it
    /// selects reach the next request.
    pub fn keys(&self) -> &SharedApiKey {
        &self.keys
    }

    pub fn into_image_client(self) -> ImageClient {
        self.image_client
    }
}

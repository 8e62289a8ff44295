use crate::{
    broker::CredentialBroker,
    config::StudioConfig,
    error::{Result, StudioError},
    gemini::transport::{DispatchError, ImageTransport},
    logger,
    models::{
        GenerateContentRequest, GenerateContentResponse, GeneratedImage, GenerationSettings,
        ImageConfig, ImageStyle, DEFAULT_IMAGE_MIME,
    },
};
use std::sync::Arc;

/// Substring Google uses when the selected key or project no longer resolves.
pub const ENTITY_NOT_FOUND_MARKER: &str = "Requested entity was not found";

#[derive(Clone)]
pub struct ImageClient {
    transport: Arc<dyn ImageTransport>,
    broker: Option<Arc<dyn CredentialBroker>>,
    flash_model: String,
    pro_model: String,
    require_broker_for_pro: bool,
}

impl ImageClient {
    pub fn new(transport: Arc<dyn ImageTransport>, config: &StudioConfig) -> Self {
        Self {
            transport,
            broker: None,
            flash_model: config.flash_model.clone(),
            pro_model: config.pro_model.clone(),
            require_broker_for_pro: config.require_broker_for_pro,
        }
    }

    pub fn with_broker(mut self, broker: Arc<dyn CredentialBroker>) -> Self {
        self.broker = Some(broker);
        self
    }

    pub fn has_broker(&self) -> bool {
        self.broker.is_some()
    }

    pub fn model_for(&self, settings: &GenerationSettings) -> &str {
        if settings.pro_mode {
            &self.pro_model
        } else {
            &self.flash_model
        }
    }

    pub fn build_request(
        &self,
        prompt: &str,
        settings: &GenerationSettings,
    ) -> (&str, GenerateContentRequest) {
        let request = GenerateContentRequest::from_prompt(
            enhance_prompt(prompt, settings.style),
            image_config_for(settings),
        );
        (self.model_for(settings), request)
    }

    pub async fn generate(
        &self,
        prompt: &str,
        settings: &GenerationSettings,
    ) -> Result<GeneratedImage> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(StudioError::EmptyPrompt);
        }

        self.ensure_credentials(settings).await?;

        let (model, request) = self.build_request(prompt, settings);
        log::info!(
            "🎨 Generating image with model: {} (style: {}, ratio: {}{})",
            model,
            settings.style,
            settings.aspect_ratio,
            if settings.pro_mode {
                format!(", size: {}", settings.image_size)
            } else {
                String::new()
            }
        );
        log::debug!("Enhanced prompt: {}", request.prompt().unwrap_or_default());

        let timer = logger::timer("image generation");
        let dispatched = self.transport.dispatch(model, &request).await;
        timer.stop();

        let response = match dispatched {
            Ok(response) => response,
            Err(e) => return Err(self.classify_failure(e, settings).await),
        };

        let (mime_type, data) = extract_inline_image(&response)?;
        log::info!("✅ Received {} ({} base64 chars)", mime_type, data.len());

        Ok(GeneratedImage::new(mime_type, data, prompt, settings.style))
    }

    /// Pro-mode gate: make sure the broker reports a selected key before
    /// spending a pro request.
    async fn ensure_credentials(&self, settings: &GenerationSettings) -> Result<()> {
        if !settings.pro_mode {
            return Ok(());
        }

        match &self.broker {
            Some(broker) => {
                if !broker.has_selected_key().await {
                    log::info!("🔑 No API key selected, opening selection flow");
                    broker.open_selection_flow().await;
                }
                Ok(())
            }
            None if self.require_broker_for_pro => Err(StudioError::CredentialUnavailable),
            None => {
                log::warn!("⚠️  Pro mode without a credential broker; skipping key check");
                Ok(())
            }
        }
    }

    async fn classify_failure(
        &self,
        err: DispatchError,
        settings: &GenerationSettings,
    ) -> StudioError {
        log::error!("❌ Gemini image generation failed: {}", err);

        if err.message.contains(ENTITY_NOT_FOUND_MARKER) && settings.pro_mode {
            if let Some(broker) = &self.broker {
                broker.open_selection_flow().await;
                return StudioError::CredentialExpired;
            }
        }

        StudioError::ExternalService(err.message)
    }
}

pub fn enhance_prompt(prompt: &str, style: ImageStyle) -> String {
    format!(
        "Generate a high quality image. Style: {}. Description: {}. Ensure high detail, good lighting, and {}.",
        style.label(),
        prompt,
        style.quality_hint()
    )
}

pub fn image_config_for(settings: &GenerationSettings) -> ImageConfig {
    ImageConfig {
        aspect_ratio: settings.aspect_ratio,
        image_size: settings.pro_mode.then_some(settings.image_size),
    }
}

/// First inline image in the first candidate, as `(mime_type, base64)`.
pub fn extract_inline_image(response: &GenerateContentResponse) -> Result<(&str, &str)> {
    let parts = response
        .candidates
        .first()
        .and_then(|candidate| candidate.content.as_ref())
        .map(|content| content.parts.as_slice())
        .unwrap_or_default();

    parts
        .iter()
        .filter_map(|part| part.inline_data.as_ref())
        .find(|inline| !inline.data.is_empty())
        .map(|inline| {
            let mime_type = inline
                .mime_type
                .as_deref()
                .filter(|mime| mime.starts_with("image/"))
                .unwrap_or(DEFAULT_IMAGE_MIME);
            (mime_type, inline.data.as_str())
        })
        .ok_or(StudioError::NoImageData)
}

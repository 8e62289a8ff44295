//! Caller-side session state: the prompt, the settings panel, and the
//! result and error slots that a front end renders.

use crate::{
    error::{Result, StudioError},
    gemini::ImageClient,
    models::{AspectRatio, GeneratedImage, GenerationSettings, ImageSize, ImageStyle, RequestOutcome},
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub const FALLBACK_ERROR_MESSAGE: &str = "Failed to generate image. Please try again.";

pub struct Studio {
    client: ImageClient,
    prompt: String,
    settings: GenerationSettings,
    generating: Arc<AtomicBool>,
    current_image: Option<GeneratedImage>,
    error: Option<String>,
}

/// Clears the in-flight flag even if the submit future is dropped mid-request.
struct InFlight(Arc<AtomicBool>);

impl InFlight {
    fn start(flag: &Arc<AtomicBool>) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(Arc::clone(flag))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Studio {
    pub fn new(client: ImageClient) -> Self {
        Self {
            client,
            prompt: String::new(),
            settings: GenerationSettings::default(),
            generating: Arc::new(AtomicBool::new(false)),
            current_image: None,
            error: None,
        }
    }

    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    pub fn settings(&self) -> GenerationSettings {
        self.settings
    }

    pub fn select_style(&mut self, style: ImageStyle) {
        self.settings.style = style;
    }

    pub fn set_aspect_ratio(&mut self, aspect_ratio: AspectRatio) {
        self.settings.aspect_ratio = aspect_ratio;
    }

    pub fn set_image_size(&mut self, image_size: ImageSize) {
        self.settings.image_size = image_size;
    }

    pub fn set_pro_mode(&mut self, enabled: bool) {
        self.settings.pro_mode = enabled;
    }

    pub fn toggle_pro_mode(&mut self) -> bool {
        self.settings.pro_mode = !self.settings.pro_mode;
        self.settings.pro_mode
    }

    pub fn is_generating(&self) -> bool {
        self.generating.load(Ordering::SeqCst)
    }

    /// Shared handle on the in-flight flag, for a front end that renders a
    /// spinner or disables its submit control while a request is out.
    pub fn in_flight_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.generating)
    }

    pub fn current_image(&self) -> Option<&GeneratedImage> {
        self.current_image.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Generates from the current prompt and a snapshot of the settings.
    ///
    /// A blank prompt is refused without touching either slot. Otherwise both
    /// slots are cleared before dispatch and exactly one is filled after.
    pub async fn submit(&mut self) -> RequestOutcome {
        if self.prompt.trim().is_empty() {
            return RequestOutcome::failure(&StudioError::EmptyPrompt);
        }
        self.error = None;
        self.current_image = None;
        let settings = self.settings;

        let result = {
            let _in_flight = InFlight::start(&self.generating);
            self.client.generate(&self.prompt, &settings).await
        };

        match result {
            Ok(image) => {
                log::info!("🖼️  Generated image {}", image.id);
                self.current_image = Some(image.clone());
                RequestOutcome::Success(image)
            }
            Err(e) => {
                log::error!("❌ {}", e);
                let message = e.to_string();
                let message = if message.trim().is_empty() {
                    FALLBACK_ERROR_MESSAGE.to_string()
                } else {
                    message
                };
                self.error = Some(message.clone());
                RequestOutcome::Failure {
                    kind: e.kind(),
                    message,
                }
            }
        }
    }

    /// Writes the current image into `dir` as `genz-2026-<id>.<ext>`.
    pub async fn download(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let image = self
            .current_image
            .as_ref()
            .ok_or_else(|| StudioError::Io("no image to download".into()))?;
        let bytes = image.decode_bytes()?;

        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(image.download_file_name());
        tokio::fs::write(&path, bytes).await?;

        log::info!("💾 Image saved to: {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StudioConfig;
    use crate::gemini::{DispatchError, ImageTransport};
    use crate::models::{GenerateContentRequest, GenerateContentResponse, Part};
    use crate::error::ErrorKind;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    /// Replies with each scripted result in turn.
    struct ScriptedTransport {
        replies: Mutex<Vec<std::result::Result<GenerateContentResponse, DispatchError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedTransport {
        fn new(
            mut replies: Vec<std::result::Result<GenerateContentResponse, DispatchError>>,
        ) -> Arc<Self> {
            replies.reverse();
            Arc::new(Self {
                replies: Mutex::new(replies),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ImageTransport for ScriptedTransport {
        async fn dispatch(
            &self,
            _model: &str,
            _request: &GenerateContentRequest,
        ) -> std::result::Result<GenerateContentResponse, DispatchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(DispatchError::new(None, "no scripted reply")))
        }
    }

    /// Records whether the studio's in-flight flag was raised while the
    /// request was out.
    #[derive(Default)]
    struct FlagWatchingTransport {
        flag: Mutex<Option<Arc<AtomicBool>>>,
        raised_during_dispatch: AtomicBool,
    }

    #[async_trait]
    impl ImageTransport for FlagWatchingTransport {
        async fn dispatch(
            &self,
            _model: &str,
            _request: &GenerateContentRequest,
        ) -> std::result::Result<GenerateContentResponse, DispatchError> {
            let raised = self
                .flag
                .lock()
                .unwrap()
                .as_ref()
                .map_or(false, |flag| flag.load(Ordering::SeqCst));
            self.raised_during_dispatch.store(raised, Ordering::SeqCst);
            image_reply()
        }
    }

    fn image_reply() -> std::result::Result<GenerateContentResponse, DispatchError> {
        Ok(GenerateContentResponse::with_parts(vec![Part::inline(
            "image/png",
            "aGVsbG8=",
        )]))
    }

    fn studio(transport: Arc<ScriptedTransport>) -> Studio {
        Studio::new(ImageClient::new(transport, &StudioConfig::default()))
    }

    #[tokio::test]
    async fn in_flight_flag_is_raised_only_while_dispatching() {
        let transport = Arc::new(FlagWatchingTransport::default());
        let mut studio = Studio::new(ImageClient::new(
            transport.clone(),
            &StudioConfig::default(),
        ));
        let handle = studio.in_flight_handle();
        *transport.flag.lock().unwrap() = Some(handle.clone());

        assert!(!studio.is_generating());
        studio.set_prompt("a red fox");
        assert!(studio.submit().await.is_success());

        assert!(transport.raised_during_dispatch.load(Ordering::SeqCst));
        assert!(!studio.is_generating());
        assert!(!handle.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn blank_prompt_leaves_slots_alone() {
        let transport = ScriptedTransport::new(vec![image_reply()]);
        let mut studio = studio(transport.clone());
        studio.set_prompt("a red fox");
        assert!(studio.submit().await.is_success());

        studio.set_prompt("   ");
        let outcome = studio.submit().await;
        assert!(matches!(
            outcome,
            RequestOutcome::Failure { kind: ErrorKind::EmptyPrompt, .. }
        ));
        assert!(studio.current_image().is_some());
        assert!(studio.error().is_none());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_clears_previous_result_and_sets_error() {
        let transport = ScriptedTransport::new(vec![
            image_reply(),
            Ok(GenerateContentResponse::default()),
        ]);
        let mut studio = studio(transport);
        studio.set_prompt("a red fox");

        studio.submit().await;
        assert!(studio.current_image().is_some());

        let outcome = studio.submit().await;
        assert_eq!(
            outcome,
            RequestOutcome::Failure {
                kind: ErrorKind::NoImageData,
                message: "No image data found in response.".to_string(),
            }
        );
        assert!(studio.current_image().is_none());
        assert_eq!(studio.error(), Some("No image data found in response."));
        assert!(!studio.is_generating());
    }

    #[tokio::test]
    async fn success_clears_previous_error() {
        let transport = ScriptedTransport::new(vec![
            Err(DispatchError::new(Some(500), "Internal error encountered.")),
            image_reply(),
        ]);
        let mut studio = studio(transport);
        studio.set_prompt("a red fox");
        studio.select_style(ImageStyle::Claymation);

        studio.submit().await;
        assert_eq!(studio.error(), Some("Internal error encountered."));

        let outcome = studio.submit().await;
        assert!(outcome.is_success());
        assert!(studio.error().is_none());
        let image = studio.current_image().unwrap();
        assert_eq!(image.style, ImageStyle::Claymation);
        assert_eq!(image.source_prompt, "a red fox");
    }

    #[tokio::test]
    async fn empty_service_message_uses_fallback() {
        let transport = ScriptedTransport::new(vec![Err(DispatchError::new(Some(500), ""))]);
        let mut studio = studio(transport);
        studio.set_prompt("a red fox");
        studio.submit().await;
        assert_eq!(studio.error(), Some(FALLBACK_ERROR_MESSAGE));
    }

    #[test]
    fn settings_setters_update_snapshot() {
        let mut studio = studio(ScriptedTransport::new(vec![]));
        studio.set_aspect_ratio(AspectRatio::Portrait);
        studio.set_image_size(ImageSize::TwoK);
        assert!(studio.toggle_pro_mode());
        let settings = studio.settings();
        assert_eq!(settings.aspect_ratio, AspectRatio::Portrait);
        assert_eq!(settings.image_size, ImageSize::TwoK);
        assert!(settings.pro_mode);
        assert!(!studio.toggle_pro_mode());
    }

    #[tokio::test]
    async fn download_writes_decoded_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let mut studio = studio(ScriptedTransport::new(vec![image_reply()]));

        assert!(matches!(
            studio.download(dir.path()).await,
            Err(StudioError::Io(_))
        ));

        studio.set_prompt("a red fox");
        studio.submit().await;
        let path = studio.download(dir.path()).await.unwrap();

        let id = &studio.current_image().unwrap().id;
        assert_eq!(
            path.file_name().unwrap().to_string_lossy(),
            format!("genz-2026-{}.png", id)
        );
        assert_eq!(std::fs::read(path).unwrap(), b"hello");
    }
}

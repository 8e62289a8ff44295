use crate::error::{ErrorKind, Result, StudioError};
use crate::models::settings::ImageStyle;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_IMAGE_MIME: &str = "image/png";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub id: String,
    /// `data:<mime>;base64,<payload>`
    pub image_data: String,
    pub source_prompt: String,
    pub style: ImageStyle,
    pub created_at: DateTime<Utc>,
}

impl GeneratedImage {
    pub fn new(
        mime_type: &str,
        base64_payload: &str,
        source_prompt: impl Into<String>,
        style: ImageStyle,
    ) -> Self {
        let created_at = Utc::now();
        Self {
            id: created_at.timestamp_millis().to_string(),
            image_data: format!("data:{};base64,{}", mime_type, base64_payload),
            source_prompt: source_prompt.into(),
            style,
            created_at,
        }
    }

    pub fn mime_type(&self) -> &str {
        self.image_data
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(';'))
            .map(|(mime, _)| mime)
            .unwrap_or(DEFAULT_IMAGE_MIME)
    }

    pub fn base64_payload(&self) -> &str {
        self.image_data
            .split_once(";base64,")
            .map(|(_, payload)| payload)
            .unwrap_or_default()
    }

    pub fn decode_bytes(&self) -> Result<Vec<u8>> {
        STANDARD
            .decode(self.base64_payload())
            .map_err(|e| StudioError::Response(format!("image payload is not valid base64: {}", e)))
    }

    pub fn file_extension(&self) -> &'static str {
        match self.mime_type() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "png",
        }
    }

    pub fn download_file_name(&self) -> String {
        format!("genz-2026-{}.{}", self.id, self.file_extension())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestOutcome {
    Success(GeneratedImage),
    Failure { kind: ErrorKind, message: String },
}

impl RequestOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RequestOutcome::Success(_))
    }

    pub fn failure(err: &StudioError) -> Self {
        RequestOutcome::Failure {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

use crate::error::StudioError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ImageStyle {
    #[default]
    #[serde(rename = "3D Render")]
    ThreeDRender,
    #[serde(rename = "Photorealistic")]
    Photorealistic,
    #[serde(rename = "Animated Emoji 3D")]
    AnimatedEmoji,
    #[serde(rename = "Cyberpunk 2077")]
    Cyberpunk,
    #[serde(rename = "Claymation")]
    Claymation,
    #[serde(rename = "Pixar Style")]
    Pixar,
    #[serde(rename = "Vaporwave")]
    Vaporwave,
}

impl ImageStyle {
    pub const ALL: [ImageStyle; 7] = [
        ImageStyle::ThreeDRender,
        ImageStyle::Photorealistic,
        ImageStyle::AnimatedEmoji,
        ImageStyle::Cyberpunk,
        ImageStyle::Claymation,
        ImageStyle::Pixar,
        ImageStyle::Vaporwave,
    ];

    /// Display name, also embedded verbatim in the enhanced prompt.
    pub fn label(&self) -> &'static str {
        match self {
            ImageStyle::ThreeDRender => "3D Render",
            ImageStyle::Photorealistic => "Photorealistic",
            ImageStyle::AnimatedEmoji => "Animated Emoji 3D",
            ImageStyle::Cyberpunk => "Cyberpunk 2077",
            ImageStyle::Claymation => "Claymation",
            ImageStyle::Pixar => "Pixar Style",
            ImageStyle::Vaporwave => "Vaporwave",
        }
    }

    /// Short command-line friendly name.
    pub fn slug(&self) -> &'static str {
        match self {
            ImageStyle::ThreeDRender => "3d-render",
            ImageStyle::Photorealistic => "photorealistic",
            ImageStyle::AnimatedEmoji => "animated-emoji",
            ImageStyle::Cyberpunk => "cyberpunk",
            ImageStyle::Claymation => "claymation",
            ImageStyle::Pixar => "pixar",
            ImageStyle::Vaporwave => "vaporwave",
        }
    }

    pub fn quality_hint(&self) -> &'static str {
        match self {
            ImageStyle::AnimatedEmoji => "cute, expressive, 3D icon style",
            _ => "professional composition",
        }
    }
}

impl fmt::Display for ImageStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ImageStyle {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ImageStyle::ALL
            .into_iter()
            .find(|style| {
                style.label().eq_ignore_ascii_case(wanted) || style.slug().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| StudioError::InvalidSetting(format!("unknown style '{}'", wanted)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "9:16")]
    Portrait,
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "3:4")]
    StandardPortrait,
    #[serde(rename = "4:3")]
    StandardLandscape,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 5] = [
        AspectRatio::Square,
        AspectRatio::Portrait,
        AspectRatio::Landscape,
        AspectRatio::StandardPortrait,
        AspectRatio::StandardLandscape,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Portrait => "9:16",
            AspectRatio::Landscape => "16:9",
            AspectRatio::StandardPortrait => "3:4",
            AspectRatio::StandardLandscape => "4:3",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        let named = match wanted.as_str() {
            "square" => Some(AspectRatio::Square),
            "portrait" => Some(AspectRatio::Portrait),
            "landscape" => Some(AspectRatio::Landscape),
            _ => None,
        };
        named
            .or_else(|| {
                AspectRatio::ALL
                    .into_iter()
                    .find(|ratio| ratio.as_str() == wanted)
            })
            .ok_or_else(|| StudioError::InvalidSetting(format!("unknown aspect ratio '{}'", s.trim())))
    }
}

/// Resolution tier; only sent to the service in pro mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ImageSize {
    #[default]
    #[serde(rename = "1K")]
    OneK,
    #[serde(rename = "2K")]
    TwoK,
    #[serde(rename = "4K")]
    FourK,
}

impl ImageSize {
    pub const ALL: [ImageSize; 3] = [ImageSize::OneK, ImageSize::TwoK, ImageSize::FourK];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::OneK => "1K",
            ImageSize::TwoK => "2K",
            ImageSize::FourK => "4K",
        }
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageSize {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ImageSize::ALL
            .into_iter()
            .find(|size| size.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| StudioError::InvalidSetting(format!("unknown image size '{}'", wanted)))
    }
}

/// Snapshot of the user's choices, taken at submit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSettings {
    pub style: ImageStyle,
    pub aspect_ratio: AspectRatio,
    pub image_size: ImageSize,
    #[serde(rename = "isProMode")]
    pub pro_mode: bool,
}

impl GenerationSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_style(mut self, style: ImageStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: AspectRatio) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }

    pub fn with_image_size(mut self, image_size: ImageSize) -> Self {
        self.image_size = image_size;
        self
    }

    pub fn with_pro_mode(mut self, enabled: bool) -> Self {
        self.pro_mode = enabled;
        self
    }
}

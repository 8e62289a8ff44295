pub mod broker;
pub mod config;
pub mod error;
pub mod gemini;
pub mod logger;
pub mod models;
pub mod studio;

pub use broker::{ApiKeySource, ConsoleBroker, CredentialBroker, LineReader, SharedApiKey};
pub use config::StudioConfig;
pub use error::{ErrorKind, Result, StudioError};
pub use gemini::{GeminiClient, ImageClient};
pub use models::{
    AspectRatio, GeneratedImage, GenerationSettings, ImageSize, ImageStyle, RequestOutcome,
};
pub use studio::Studio;

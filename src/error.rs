use thiserror::Error;

pub const NO_IMAGE_DATA_MESSAGE: &str = "No image data found in response.";
pub const CREDENTIAL_EXPIRED_MESSAGE: &str =
    "API Key selection failed or expired. Please try again.";

#[derive(Debug, Error)]
pub enum StudioError {
    #[error("Prompt must not be empty")]
    EmptyPrompt,
    #[error("{}", NO_IMAGE_DATA_MESSAGE)]
    NoImageData,
    #[error("{}", CREDENTIAL_EXPIRED_MESSAGE)]
    CredentialExpired,
    #[error("Pro mode requires an API key broker, but none is available")]
    CredentialUnavailable,
    /// Dispatch failures other than an expired credential. The message is
    /// the service's own, unmodified.
    #[error("{0}")]
    ExternalService(String),
    #[error("Invalid setting: {0}")]
    InvalidSetting(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Response error: {0}")]
    Response(String),
    #[error("IO error: {0}")]
    Io(String),
}

/// Coarse classification of a failure, as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    EmptyPrompt,
    NoImageData,
    CredentialExpired,
    CredentialUnavailable,
    ExternalService,
    Internal,
}

impl StudioError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StudioError::EmptyPrompt => ErrorKind::EmptyPrompt,
            StudioError::NoImageData => ErrorKind::NoImageData,
            StudioError::CredentialExpired => ErrorKind::CredentialExpired,
            StudioError::CredentialUnavailable => ErrorKind::CredentialUnavailable,
            StudioError::ExternalService(_) => ErrorKind::ExternalService,
            StudioError::InvalidSetting(_)
            | StudioError::Config(_)
            | StudioError::Response(_)
            | StudioError::Io(_) => ErrorKind::Internal,
        }
    }
}

impl From<std::io::Error> for StudioError {
    fn from(err: std::io::Error) -> Self {
        StudioError::Io(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StudioError>;

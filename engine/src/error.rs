use reqwest::StatusCode;
use thiserror::Error;

/// Everything that can end a generation run.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("API key not found")]
    MissingCredential,

    #[error("Upload failed ({status}): {body}")]
    UploadFailed { status: StatusCode, body: String },

    #[error("{message}")]
    ApiError { message: String },

    #[error("{0}")]
    GenerationFailed(String),

    #[error("Generation timeout after {attempts} attempts - please try again")]
    Timeout { attempts: u32 },

    #[error("No model output received")]
    EmptyOutput,

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub(crate) fn api(message: impl Into<String>) -> Self {
        Self::ApiError {
            message: message.into(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

//! Error types shared by the runtimes, the hint client and the stores.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("{language} runtime unavailable: {reason}")]
    Unavailable { language: String, reason: String },

    #[error("execution timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum HintError {
    #[error("generation request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("generation endpoint returned {status}: {body}")]
    Status { status: reqwest::StatusCode, body: String },

    #[error("generation endpoint returned an empty response")]
    EmptyResponse,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("stored value is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

// Lets every caller waiting on one load attempt receive that attempt's error.
impl Clone for RuntimeError {
    fn clone(&self) -> Self {
        match self {
            Self::UnsupportedLanguage(lang) => Self::UnsupportedLanguage(lang.clone()),
            Self::Unavailable { language, reason } => Self::Unavailable {
                language: language.clone(),
                reason: reason.clone(),
            },
            Self::Timeout(d) => Self::Timeout(*d),
            Self::Io(e) => Self::Io(std::io::Error::new(e.kind(), e.to_string())),
        }
    }
}

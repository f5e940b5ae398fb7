use reqwest::StatusCode;
use thiserror::Error;

pub use anyhow::Context;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
    #[error("request for {url} failed with status {status}")]
    UpstreamStatus { status: StatusCode, url: String },
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn message<T: Into<String>>(msg: T) -> Self {
        AppError::Message(msg.into())
    }

    pub fn upstream_status(status: StatusCode, url: impl Into<String>) -> Self {
        AppError::UpstreamStatus {
            status,
            url: url.into(),
        }
    }

    /// HTTP status attached to the error, when the upstream produced one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            AppError::UpstreamStatus { status, .. } => Some(*status),
            AppError::Reqwest(err) => err.status(),
            _ => None,
        }
    }
}

use thiserror::Error;

use crate::core::google::GoogleError;
use crate::core::kv::StoreError;
use crate::core::mattermost::MattermostError;

/// How a user-facing exception should be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionKind {
    Text,
    Markdown,
}

/// Everything a call handler can fail with.
#[derive(Debug, Error)]
pub enum AppError {
    /// Plain failure, e.g. the OAuth2 redirect came back without a code.
    #[error("{0}")]
    BadRequest(String),
    #[error("{message}")]
    Exception { kind: ExceptionKind, message: String },
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error(transparent)]
    Google(#[from] GoogleError),
    #[error(transparent)]
    Mattermost(#[from] MattermostError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppError {
    pub fn text(message: impl Into<String>) -> Self {
        AppError::Exception {
            kind: ExceptionKind::Text,
            message: message.into(),
        }
    }

    pub fn markdown(message: impl Into<String>) -> Self {
        AppError::Exception {
            kind: ExceptionKind::Markdown,
            message: message.into(),
        }
    }

    /// Wraps a Google failure into a text exception with a fixed prefix.
    pub fn google_failed(err: impl std::fmt::Display) -> Self {
        AppError::text(format!("Google failed: {}", err))
    }

    pub fn kind(&self) -> Option<ExceptionKind> {
        match self {
            AppError::Exception { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

//! Client error types
//!
//! The server answers failures with `{"error": "...", "code": "..."}`; the
//! `error` string is what a user gets to read.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Shown when the server gave no readable reason
pub const FALLBACK_MESSAGE: &str = "An unexpected error occurred";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{message}")]
    Api { status: StatusCode, message: String },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

impl ClientError {
    /// Build an API error from a non-success response body
    pub fn from_body(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|body| body.error)
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_MESSAGE.to_string());
        ClientError::Api { status, message }
    }

    /// HTTP status when the server answered
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Transport(err) => err.status(),
            _ => None,
        }
    }

    /// Text fit for display
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Api { message, .. } => message.clone(),
            _ => FALLBACK_MESSAGE.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    pub fn is_conflict(&self) -> bool {
        self.status() == Some(StatusCode::CONFLICT)
    }
}

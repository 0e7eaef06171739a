use serde_derive::Deserialize;
use serde_derive::Serialize;
use thiserror::Error;

/// Body the backend sends alongside any non-2xx status.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// 401 from any endpoint. The session has already been torn down by the
    /// time the caller sees this.
    #[error("Unauthorized: {}", .message.as_deref().unwrap_or("session is no longer valid"))]
    Unauthorized { message: Option<String> },

    #[error("Request failed with status {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Status {
        status: u16,
        message: Option<String>,
    },

    #[error("Failed to encode request body: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to decode response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// Message supplied by the server, if the failure came with one.
    pub fn server_message(&self) -> Option<&str> {
        return match self {
            ApiError::Unauthorized { message } | ApiError::Status { message, .. } => {
                message.as_deref()
            }
            _ => None,
        };
    }

    pub fn status(&self) -> Option<u16> {
        return match self {
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Network(err) => err.status().map(|status| return status.as_u16()),
            _ => None,
        };
    }

    pub fn is_unauthorized(&self) -> bool {
        return matches!(self, ApiError::Unauthorized { .. });
    }

    /// Message to show for a failed operation: the server's when it sent one,
    /// otherwise the operation's own fallback.
    pub fn display_message(&self, fallback: &str) -> String {
        return self.server_message().unwrap_or(fallback).to_string();
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> ApiError {
        if err.is_timeout() {
            return ApiError::Timeout;
        }

        return ApiError::Network(err);
    }
}

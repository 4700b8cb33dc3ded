use crate::{Error, upstream::GenerationOutput};
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// What the worker hands back for one job. Serialised untagged: callers tell
/// the shapes apart by the presence of `error`.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum InferenceResponse {
    Error(ErrorEnvelope),
    Models { models: Vec<String> },
    Generated(GenerationOutput),
    /// Body of a 200 from a single-stage forward, passed through as-is.
    Upstream(Value),
}

impl InferenceResponse {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(ErrorEnvelope {
            error: message.into(),
            details: None,
        })
    }

    pub fn error_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Error(ErrorEnvelope {
            error: message.into(),
            details: Some(details.into()),
        })
    }

    pub fn images(images: Vec<String>) -> Self {
        Self::Generated(GenerationOutput {
            images,
            extra: Map::new(),
        })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Envelope for a failed single-stage forward.
    pub fn from_request_error(error: &Error) -> Self {
        match error {
            Error::Upstream { status, body } => Self::error_with_details(
                format!("Request failed with status {}", status),
                body.clone(),
            ),
            e if e.is_timeout() => Self::error("Request timed out"),
            Error::InvalidRequest(msg) => Self::error(msg.clone()),
            e => Self::error(format!("Request failed: {}", e)),
        }
    }
}

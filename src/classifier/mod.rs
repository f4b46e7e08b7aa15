mod gradio;
mod sse;

pub use gradio::GradioClient;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Bytes and content type of one image, ready for transport.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub file_name: String,
}

#[derive(Debug, Error)]
pub enum ClassifyError {
    /// Network failure, timeout, or a non-2xx status.
    #[error("transport error: {0}")]
    Transport(String),
    /// The service answered but without a usable prediction.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for ClassifyError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ClassifyError::Malformed(e.to_string())
        } else {
            ClassifyError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ClassifyError {
    fn from(e: serde_json::Error) -> Self {
        ClassifyError::Malformed(e.to_string())
    }
}

/// Remote image classification endpoint.
///
/// Returns the service's ordered prediction sequence untouched; picking the
/// first element is the workflow's job.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, image: &ImagePayload) -> Result<Vec<Value>, ClassifyError>;
}

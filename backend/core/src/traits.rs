use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::message::ChatMessage;

/// A remote multimodal model endpoint.
///
/// Implementations report every answer the service gives, including non-success
/// ones, through [`ServiceResponse::status_code`]. Only failures to reach the
/// service at all are returned as errors.
#[async_trait]
pub trait MultimodalService: Send + Sync {
    /// Service name (e.g., "dashscope", "mock").
    fn name(&self) -> &str;

    /// Invoke the model once.
    async fn invoke(&self, call: &ServiceCall) -> Result<ServiceResponse>;
}

/// Arguments for one model invocation.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceCall {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// What the service answered.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceResponse {
    pub status_code: u16,
    /// Service-provided status text; empty on success for most services.
    #[serde(default)]
    pub message: String,
    /// Raw `output` object. Its shape is only checked during extraction.
    #[serde(default)]
    pub output: Option<serde_json::Value>,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub usage: Option<TokenUsage>,
}

impl ServiceResponse {
    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}

/// Token accounting reported by the service, when available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

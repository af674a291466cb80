//! DashScope multimodal-generation client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use vidlens_core::{
    ChatMessage, ContentPart, MultimodalService, Result, ServiceCall, ServiceResponse, Settings,
    TokenUsage, VidlensError,
};

use crate::reference::{classify, Classification};
use crate::upload::{self, OSS_RESOLVE_HEADER};

const GENERATION_PATH: &str = "/services/aigc/multimodal-generation/generation";

/// DashScope (Qwen-VL) multimodal service over HTTP.
pub struct DashScopeService {
    client: Client,
    api_key: String,
    base_url: String,
}

impl DashScopeService {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: vidlens_core::settings::DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.api_key.clone()).with_base_url(&settings.base_url)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, GENERATION_PATH)
    }

    /// Copy of `call.messages` with every local video replaced by an `oss://`
    /// URL. The flag reports whether anything was uploaded.
    async fn resolve_local_videos(&self, call: &ServiceCall) -> Result<(Vec<ChatMessage>, bool)> {
        let mut messages = call.messages.clone();
        let mut policy = None;
        let mut uploaded = false;

        for part in messages.iter_mut().flat_map(|m| m.content.iter_mut()) {
            let ContentPart::Video { video, .. } = part else {
                continue;
            };
            let Classification::LocalPath(path) = classify(video) else {
                continue;
            };
            if policy.is_none() {
                policy = Some(
                    upload::fetch_policy(&self.client, &self.base_url, &self.api_key, &call.model)
                        .await?,
                );
            }
            if let Some(policy) = &policy {
                *video = upload::upload_file(&self.client, policy, &path).await?;
                uploaded = true;
            }
        }

        Ok((messages, uploaded))
    }
}

#[derive(Serialize)]
struct GenerationRequest<'a> {
    model: &'a str,
    input: Input<'a>,
    parameters: Parameters,
}

#[derive(Serialize)]
struct Input<'a> {
    messages: &'a [ChatMessage],
}

#[derive(Serialize)]
struct Parameters {
    max_tokens: u32,
    temperature: f32,
}

/// Union of the success and error body shapes.
#[derive(Deserialize, Default)]
struct GenerationResponse {
    output: Option<serde_json::Value>,
    usage: Option<TokenUsage>,
    request_id: Option<String>,
    code: Option<String>,
    message: Option<String>,
}

#[async_trait]
impl MultimodalService for DashScopeService {
    fn name(&self) -> &str {
        "dashscope"
    }

    async fn invoke(&self, call: &ServiceCall) -> Result<ServiceResponse> {
        let (messages, uploaded) = self.resolve_local_videos(call).await?;
        let body = GenerationRequest {
            model: &call.model,
            input: Input {
                messages: &messages,
            },
            parameters: Parameters {
                max_tokens: call.max_tokens,
                temperature: call.temperature,
            },
        };

        debug!(model = %call.model, "Sending request to DashScope");

        let mut request = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json");
        if uploaded {
            request = request.header(OSS_RESOLVE_HEADER, "enable");
        }

        let response = request
            .json(&body)
            .send()
            .await
            .map_err(|e| VidlensError::Transport(format!("DashScope HTTP request failed: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| VidlensError::Transport(format!("Failed to read DashScope response: {e}")))?;

        let parsed: GenerationResponse = match serde_json::from_str(&text) {
            Ok(parsed) => parsed,
            Err(e) if status.is_success() => {
                return Err(VidlensError::Extraction(format!(
                    "DashScope returned a non-JSON body: {e}"
                )));
            }
            // Gateways in front of the API answer errors in plain text.
            Err(_) => GenerationResponse {
                message: Some(text.trim().to_string()),
                ..Default::default()
            },
        };

        // The body's message is passed through as-is. Only when it is missing
        // or empty does the error code, then the HTTP reason phrase, stand in.
        let message = parsed
            .message
            .filter(|m| !m.is_empty())
            .or(parsed.code)
            .or_else(|| status.canonical_reason().map(str::to_string))
            .unwrap_or_default();

        debug!(
            status = status.as_u16(),
            request_id = parsed.request_id.as_deref().unwrap_or("-"),
            "DashScope responded"
        );

        Ok(ServiceResponse {
            status_code: status.as_u16(),
            message,
            output: parsed.output,
            request_id: parsed.request_id,
            usage: parsed.usage,
        })
    }
}

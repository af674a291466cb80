use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use vidlens_core::{MultimodalService, Result, ServiceCall, ServiceResponse};

/// A multimodal service that returns canned responses.
pub struct MockService {
    name: String,
    response: ServiceResponse,
    delay: Option<Duration>,
    calls: Mutex<Vec<ServiceCall>>,
}

impl MockService {
    /// Answers every call successfully with "Mock response".
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            response: Self::text_response("Mock response"),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        let text: String = text.into();
        self.response = Self::text_response(&text);
        self
    }

    /// Answer with a non-success status and message.
    pub fn with_failure(mut self, status_code: u16, message: impl Into<String>) -> Self {
        self.response = ServiceResponse {
            status_code,
            message: message.into(),
            ..Default::default()
        };
        self
    }

    /// Answer with status 200 and an arbitrary `output` value.
    pub fn with_output(mut self, output: serde_json::Value) -> Self {
        self.response = ServiceResponse {
            status_code: 200,
            output: Some(output),
            ..Default::default()
        };
        self
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Calls received so far.
    pub fn calls(&self) -> Vec<ServiceCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn text_response(text: &str) -> ServiceResponse {
        ServiceResponse {
            status_code: 200,
            output: Some(json!({
                "choices": [{
                    "finish_reason": "stop",
                    "message": { "role": "assistant", "content": [{ "text": text }] }
                }]
            })),
            request_id: Some("mock-request".to_string()),
            ..Default::default()
        }
    }
}

#[async_trait]
impl MultimodalService for MockService {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, call: &ServiceCall) -> Result<ServiceResponse> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call.clone());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.response.clone())
    }
}

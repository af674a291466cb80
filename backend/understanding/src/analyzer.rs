//! Video analysis: validate → build → invoke → extract.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{error, info};

use vidlens_core::{
    MultimodalService, Result, ServiceCall, ServiceResponse, Settings, TokenUsage, VidlensError,
};
use vidlens_logging::redact_sensitive_data;

use crate::dashscope::DashScopeService;
use crate::reference::VideoReference;
use crate::request::{AnalysisRequest, PromptKind, RequestBuilder};

/// The answer to one analysis call.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub text: String,
    pub model: String,
    pub request_id: Option<String>,
    pub usage: Option<TokenUsage>,
    pub duration: Duration,
}

/// Runs analyses against a [`MultimodalService`].
///
/// Holds no per-call state; one analyzer can serve any number of calls.
pub struct VideoAnalyzer {
    settings: Arc<Settings>,
    builder: RequestBuilder,
    service: Arc<dyn MultimodalService>,
}

impl VideoAnalyzer {
    pub fn new(settings: Arc<Settings>, service: Arc<dyn MultimodalService>) -> Self {
        Self {
            builder: RequestBuilder::from_settings(&settings),
            settings,
            service,
        }
    }

    /// Analyzer backed by the DashScope HTTP API.
    pub fn dashscope(settings: Arc<Settings>) -> Self {
        let service = Arc::new(DashScopeService::from_settings(&settings));
        info!(model = %settings.model, "DashScope analyzer ready");
        Self::new(settings, service)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn builder(&self) -> &RequestBuilder {
        &self.builder
    }

    /// Ask `question` about the video at `reference`.
    pub async fn analyze(
        &self,
        reference: &str,
        question: &str,
        fps: Option<f64>,
    ) -> Result<AnalysisResult> {
        info!(reference = %redact_sensitive_data(reference), "Analyzing video");
        let reference = VideoReference::new(reference);
        let request = self.builder.build(&reference, question, fps);
        self.run(request).await
    }

    /// Render `template` with `values` and ask the result.
    pub async fn analyze_with_template(
        &self,
        reference: &str,
        template: &str,
        values: &HashMap<String, String>,
    ) -> Result<AnalysisResult> {
        info!(reference = %redact_sensitive_data(reference), template = %preview(template), "Analyzing video with template");
        let reference = VideoReference::new(reference);
        let request = self
            .builder
            .build_from_template(&reference, template, values, None);
        self.run(request).await
    }

    pub async fn analyze_prompt(&self, reference: &str, kind: &PromptKind) -> Result<AnalysisResult> {
        info!(reference = %redact_sensitive_data(reference), kind = ?kind, "Analyzing video");
        let reference = VideoReference::new(reference);
        let request = self.builder.build_prompt(&reference, kind, None);
        self.run(request).await
    }

    pub async fn summarize(&self, reference: &str) -> Result<AnalysisResult> {
        self.analyze_prompt(reference, &PromptKind::Summary).await
    }

    pub async fn scenes(&self, reference: &str) -> Result<AnalysisResult> {
        self.analyze_prompt(reference, &PromptKind::Scenes).await
    }

    pub async fn ask(&self, reference: &str, question: &str) -> Result<AnalysisResult> {
        self.analyze_prompt(reference, &PromptKind::Custom(question.to_string()))
            .await
    }

    /// Send an already built request.
    pub async fn submit(&self, request: AnalysisRequest) -> Result<AnalysisResult> {
        let call = ServiceCall {
            model: self.settings.model.clone(),
            messages: request.into_messages(),
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        };

        let start = Instant::now();
        let invocation = self.service.invoke(&call);
        let response = match self.settings.request_timeout {
            Some(limit) => tokio::time::timeout(limit, invocation)
                .await
                .map_err(|_| VidlensError::Timeout(limit))??,
            None => invocation.await?,
        };

        if !response.is_success() {
            return Err(VidlensError::RemoteService {
                status_code: response.status_code,
                message: response.message,
            });
        }

        let text = extract_text(&response)?;
        let duration = start.elapsed();
        info!(
            service = self.service.name(),
            model = %call.model,
            latency_ms = duration.as_millis() as u64,
            "Video analysis complete"
        );

        Ok(AnalysisResult {
            text,
            model: call.model,
            request_id: response.request_id,
            usage: response.usage,
            duration,
        })
    }

    async fn run(&self, request: Result<AnalysisRequest>) -> Result<AnalysisResult> {
        let result = match request {
            Ok(request) => self.submit(request).await,
            Err(e) => Err(e),
        };
        if let Err(e) = &result {
            error!(error = %e, "Video analysis failed");
        }
        result
    }
}

/// First text element of the first choice.
pub fn extract_text(response: &ServiceResponse) -> Result<String> {
    let output = response
        .output
        .as_ref()
        .ok_or_else(|| VidlensError::Extraction("response has no output".into()))?;
    let choice = output["choices"]
        .get(0)
        .ok_or_else(|| VidlensError::Extraction("output has no choices".into()))?;
    let part = choice["message"]["content"]
        .get(0)
        .ok_or_else(|| VidlensError::Extraction("first choice has no content".into()))?;
    part["text"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| VidlensError::Extraction("first content element has no text".into()))
}

fn preview(template: &str) -> String {
    template.chars().take(50).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::mock::MockService;

    fn analyzer(service: MockService) -> (VideoAnalyzer, Arc<MockService>) {
        let service = Arc::new(service);
        let settings = Arc::new(Settings::new("sk-test"));
        (VideoAnalyzer::new(settings, service.clone()), service)
    }

    #[tokio::test]
    async fn test_analyze_remote_url() {
        let (analyzer, service) = analyzer(MockService::new("mock").with_text("A cat plays."));
        let result = analyzer
            .analyze("https://example.com/clip.mp4", "describe this", None)
            .await
            .unwrap();
        assert_eq!(result.text, "A cat plays.");
        assert_eq!(result.model, "qwen-vl-max-latest");

        let calls = service.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].max_tokens, 1500);
        let payload = serde_json::to_value(&calls[0].messages).unwrap();
        assert_eq!(
            payload[1]["content"],
            json!([
                { "video": "https://example.com/clip.mp4", "fps": 1.0 },
                { "text": "describe this" }
            ])
        );
    }

    #[tokio::test]
    async fn test_local_file_with_bad_default_fps() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("clip.mp4");
        std::fs::write(&file, b"x").unwrap();
        let raw = file.to_str().unwrap();

        let service = Arc::new(MockService::new("mock"));
        let settings = Arc::new(Settings::new("sk-test").with_default_fps(-3.0));
        let analyzer = VideoAnalyzer::new(settings, service.clone());
        assert_eq!(analyzer.builder().default_fps(), 1.0);

        analyzer.analyze(raw, "describe this", None).await.unwrap();

        let calls = service.calls();
        let payload = serde_json::to_value(&calls[0].messages).unwrap();
        assert_eq!(
            payload[1]["content"],
            json!([
                { "video": raw, "fps": 1.0 },
                { "text": "describe this" }
            ])
        );
    }

    #[tokio::test]
    async fn test_invalid_reference_skips_service() {
        let (analyzer, service) = analyzer(MockService::new("mock"));
        let err = analyzer
            .analyze("ftp://example.com/clip.mp4", "describe this", None)
            .await
            .unwrap_err();
        assert!(matches!(err, VidlensError::InvalidReference { .. }));
        assert!(service.calls().is_empty());
    }

    #[tokio::test]
    async fn test_remote_failure_carries_message() {
        let (analyzer, _) = analyzer(MockService::new("mock").with_failure(500, "overloaded"));
        let err = analyzer
            .analyze("https://example.com/clip.mp4", "q", None)
            .await
            .unwrap_err();
        match err {
            VidlensError::RemoteService { status_code, message } => {
                assert_eq!(status_code, 500);
                assert_eq!(message, "overloaded");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_bad_shapes_are_extraction_errors() {
        for output in [
            json!({}),
            json!({ "choices": [] }),
            json!({ "choices": [{ "message": { "content": [] } }] }),
            json!({ "choices": [{ "message": { "content": [{ "image": "x" }] } }] }),
        ] {
            let (analyzer, _) = analyzer(MockService::new("mock").with_output(output.clone()));
            let err = analyzer
                .analyze("https://example.com/clip.mp4", "q", None)
                .await
                .unwrap_err();
            assert!(matches!(err, VidlensError::Extraction(_)), "{output}");
        }
    }

    #[tokio::test]
    async fn test_timeout_at_remote_boundary() {
        let service = Arc::new(MockService::new("slow").with_delay(Duration::from_secs(5)));
        let settings =
            Arc::new(Settings::new("sk-test").with_timeout(Some(Duration::from_millis(20))));
        let analyzer = VideoAnalyzer::new(settings, service);

        let err = analyzer
            .analyze("https://example.com/clip.mp4", "q", None)
            .await
            .unwrap_err();
        assert!(matches!(err, VidlensError::Timeout(d) if d == Duration::from_millis(20)));
    }

    #[tokio::test]
    async fn test_prompt_intents_and_templates() {
        let (analyzer, service) = analyzer(MockService::new("mock"));
        analyzer.summarize("https://example.com/a.mp4").await.unwrap();
        analyzer.scenes("https://example.com/a.mp4").await.unwrap();
        analyzer
            .ask("https://example.com/a.mp4", "Who speaks first?")
            .await
            .unwrap();

        let values = HashMap::from([("name".to_string(), "cat".to_string())]);
        analyzer
            .analyze_with_template("https://example.com/a.mp4", "{name} video", &values)
            .await
            .unwrap();

        let err = analyzer
            .analyze_with_template("https://example.com/a.mp4", "{missing}", &HashMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, VidlensError::TemplateFormat(_)));

        let calls = service.calls();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[2].messages[1].content[1].as_text(), Some("Who speaks first?"));
        assert_eq!(calls[3].messages[1].content[1].as_text(), Some("cat video"));
    }
}

//! Blocking wrapper around [`VideoAnalyzer`] for callers without a runtime.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::runtime::{Builder, Runtime};

use vidlens_core::{MultimodalService, Result, Settings};

use crate::analyzer::{AnalysisResult, VideoAnalyzer};
use crate::request::PromptKind;

/// Drives a [`VideoAnalyzer`] on its own current-thread runtime.
///
/// Must not be used from inside an async context; tokio panics when a
/// runtime is blocked on from within another one.
pub struct BlockingVideoAnalyzer {
    inner: VideoAnalyzer,
    runtime: Runtime,
}

impl BlockingVideoAnalyzer {
    pub fn new(settings: Arc<Settings>, service: Arc<dyn MultimodalService>) -> Result<Self> {
        Ok(Self::wrap(VideoAnalyzer::new(settings, service), runtime()?))
    }

    pub fn dashscope(settings: Arc<Settings>) -> Result<Self> {
        Ok(Self::wrap(VideoAnalyzer::dashscope(settings), runtime()?))
    }

    fn wrap(inner: VideoAnalyzer, runtime: Runtime) -> Self {
        Self { inner, runtime }
    }

    pub fn analyze(&self, reference: &str, question: &str, fps: Option<f64>) -> Result<AnalysisResult> {
        self.runtime
            .block_on(self.inner.analyze(reference, question, fps))
    }

    pub fn analyze_with_template(
        &self,
        reference: &str,
        template: &str,
        values: &HashMap<String, String>,
    ) -> Result<AnalysisResult> {
        self.runtime
            .block_on(self.inner.analyze_with_template(reference, template, values))
    }

    pub fn analyze_prompt(&self, reference: &str, kind: &PromptKind) -> Result<AnalysisResult> {
        self.runtime.block_on(self.inner.analyze_prompt(reference, kind))
    }

    pub fn summarize(&self, reference: &str) -> Result<AnalysisResult> {
        self.analyze_prompt(reference, &PromptKind::Summary)
    }

    pub fn scenes(&self, reference: &str) -> Result<AnalysisResult> {
        self.analyze_prompt(reference, &PromptKind::Scenes)
    }

    pub fn ask(&self, reference: &str, question: &str) -> Result<AnalysisResult> {
        self.analyze_prompt(reference, &PromptKind::Custom(question.to_string()))
    }

    pub fn inner(&self) -> &VideoAnalyzer {
        &self.inner
    }
}

fn runtime() -> Result<Runtime> {
    Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| anyhow::Error::new(e).context("Failed to start blocking runtime").into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockService;
    use vidlens_core::VidlensError;

    #[test]
    fn test_blocking_calls() {
        let service = Arc::new(MockService::new("mock").with_text("Two people talk."));
        let analyzer =
            BlockingVideoAnalyzer::new(Arc::new(Settings::new("sk-test")), service.clone()).unwrap();

        let result = analyzer.summarize("https://example.com/clip.mp4").unwrap();
        assert_eq!(result.text, "Two people talk.");

        let err = analyzer.ask("https://", "q").unwrap_err();
        assert!(matches!(err, VidlensError::InvalidReference { .. }));
        assert_eq!(service.calls().len(), 1);
    }
}

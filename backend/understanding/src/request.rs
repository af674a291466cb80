//! Request assembly for the multimodal service.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};

use vidlens_core::settings::DEFAULT_FPS;
use vidlens_core::{ChatMessage, ContentPart, Result, Role, Settings, VidlensError};
use vidlens_logging::redact_sensitive_data;

use crate::reference::VideoReference;
use crate::template;

/// Fixed preamble sent as the system message of every request.
pub const SYSTEM_PROMPT: &str = "You are a helpful video analysis assistant.";

/// Canned analysis intents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptKind {
    Summary,
    Scenes,
    Custom(String),
}

impl PromptKind {
    const SUMMARY: &'static str = "Provide a detailed summary of this video, including the main \
         content, settings, people and key events.";
    const SCENES: &'static str = "Identify the main scenes in this video and the transitions \
         between them, and describe what happens in each scene.";

    /// Template text and substitution values for this intent.
    fn template(&self) -> (&str, HashMap<String, String>) {
        match self {
            Self::Summary => (Self::SUMMARY, HashMap::new()),
            Self::Scenes => (Self::SCENES, HashMap::new()),
            Self::Custom(question) => (
                "{question}",
                HashMap::from([("question".to_string(), question.clone())]),
            ),
        }
    }
}

/// A fully assembled request: system preamble followed by the user turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AnalysisRequest {
    messages: Vec<ChatMessage>,
}

impl AnalysisRequest {
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<ChatMessage> {
        self.messages
    }

    /// The reference and sampling rate carried by the user turn.
    pub fn video(&self) -> Option<(&str, f64)> {
        self.user_parts().find_map(|part| match part {
            ContentPart::Video { video, fps } => Some((video.as_str(), *fps)),
            ContentPart::Text { .. } => None,
        })
    }

    pub fn fps(&self) -> Option<f64> {
        self.video().map(|(_, fps)| fps)
    }

    /// The question text of the user turn.
    pub fn question(&self) -> Option<&str> {
        self.user_parts().find_map(ContentPart::as_text)
    }

    fn user_parts(&self) -> impl Iterator<Item = &ContentPart> + '_ {
        self.messages
            .iter()
            .filter(|m| m.role == Role::User)
            .flat_map(|m| m.content.iter())
    }
}

/// Turns a validated reference and a question into an [`AnalysisRequest`].
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    default_fps: f64,
}

impl RequestBuilder {
    /// A default that is not a positive finite number is replaced by
    /// [`DEFAULT_FPS`].
    pub fn new(default_fps: f64) -> Self {
        let default_fps = if is_usable_fps(default_fps) {
            default_fps
        } else {
            warn!(default_fps, fallback = DEFAULT_FPS, "Unusable default fps, using fallback");
            DEFAULT_FPS
        };
        Self { default_fps }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.default_fps)
    }

    pub fn default_fps(&self) -> f64 {
        self.default_fps
    }

    /// Build a request. Fails without producing anything when the reference
    /// did not validate.
    pub fn build(
        &self,
        reference: &VideoReference,
        question: &str,
        fps: Option<f64>,
    ) -> Result<AnalysisRequest> {
        ensure_valid(reference)?;

        let fps = self.effective_fps(fps);
        debug!(reference = %redact_sensitive_data(reference.raw()), fps, "Assembling analysis request");

        let messages = vec![
            ChatMessage::new(Role::System, vec![ContentPart::text(SYSTEM_PROMPT)]),
            ChatMessage::new(
                Role::User,
                vec![
                    ContentPart::video(reference.raw(), fps),
                    ContentPart::text(question),
                ],
            ),
        ];
        Ok(AnalysisRequest { messages })
    }

    /// Render `template` with `values`, then build as [`RequestBuilder::build`].
    ///
    /// The reference is checked first so an invalid reference is reported even
    /// when the template is broken too.
    pub fn build_from_template(
        &self,
        reference: &VideoReference,
        template: &str,
        values: &HashMap<String, String>,
        fps: Option<f64>,
    ) -> Result<AnalysisRequest> {
        ensure_valid(reference)?;
        let question = template::render(template, values)?;
        self.build(reference, &question, fps)
    }

    pub fn build_prompt(
        &self,
        reference: &VideoReference,
        kind: &PromptKind,
        fps: Option<f64>,
    ) -> Result<AnalysisRequest> {
        let (template, values) = kind.template();
        self.build_from_template(reference, template, &values, fps)
    }

    pub fn summary(&self, reference: &VideoReference) -> Result<AnalysisRequest> {
        self.build_prompt(reference, &PromptKind::Summary, None)
    }

    pub fn scenes(&self, reference: &VideoReference) -> Result<AnalysisRequest> {
        self.build_prompt(reference, &PromptKind::Scenes, None)
    }

    pub fn custom(&self, reference: &VideoReference, question: &str) -> Result<AnalysisRequest> {
        self.build_prompt(reference, &PromptKind::Custom(question.to_string()), None)
    }

    /// Caller rate when it is a usable positive number, the default otherwise.
    fn effective_fps(&self, fps: Option<f64>) -> f64 {
        fps.filter(|f| is_usable_fps(*f))
            .unwrap_or(self.default_fps)
    }
}

fn is_usable_fps(fps: f64) -> bool {
    fps.is_finite() && fps > 0.0
}

fn ensure_valid(reference: &VideoReference) -> Result<()> {
    match reference.invalid_reason() {
        Some(reason) => Err(VidlensError::InvalidReference {
            reference: reference.raw().to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

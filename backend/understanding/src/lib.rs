//! Video understanding through a remote multimodal model.
//!
//! A reference (URL or local path) is classified, turned into a request with
//! a question and a frame sampling rate, sent to the model, and the first text
//! answer is extracted.

pub mod analyzer;
pub mod blocking;
pub mod dashscope;
pub mod mock;
pub mod reference;
pub mod request;
pub mod template;
pub mod upload;

pub use analyzer::{extract_text, AnalysisResult, VideoAnalyzer};
pub use blocking::BlockingVideoAnalyzer;
pub use dashscope::DashScopeService;
pub use mock::MockService;
pub use reference::{classify, Classification, InvalidReason, VideoReference};
pub use request::{AnalysisRequest, PromptKind, RequestBuilder, SYSTEM_PROMPT};

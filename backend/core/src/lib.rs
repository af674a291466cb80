pub mod error;
pub mod message;
pub mod settings;
pub mod traits;

pub use error::{Result, TemplateError, VidlensError};
pub use message::{ChatMessage, ContentPart, Role};
pub use settings::Settings;
pub use traits::{MultimodalService, ServiceCall, ServiceResponse, TokenUsage};

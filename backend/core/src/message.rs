use serde::{Deserialize, Serialize};

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One element of a message's content list.
///
/// Serialized without a tag: the remote service tells parts apart by their keys
/// (`{"text": ..}` vs `{"video": .., "fps": ..}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentPart {
    Video { video: String, fps: f64 },
    Text { text: String },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn video(reference: impl Into<String>, fps: f64) -> Self {
        Self::Video {
            video: reference.into(),
            fps,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            Self::Video { .. } => None,
        }
    }
}

/// A role-tagged message sent to the multimodal service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: Vec<ContentPart>,
}

impl ChatMessage {
    pub fn new(role: Role, content: Vec<ContentPart>) -> Self {
        Self { role, content }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_message_shape() {
        let msg = ChatMessage::new(
            Role::User,
            vec![
                ContentPart::video("https://example.com/clip.mp4", 1.0),
                ContentPart::text("describe this"),
            ],
        );
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            value,
            json!({
                "role": "user",
                "content": [
                    { "video": "https://example.com/clip.mp4", "fps": 1.0 },
                    { "text": "describe this" }
                ]
            })
        );
    }
}

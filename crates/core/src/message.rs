//! Chat message types exchanged with the model.
//!
//! A prompt is an ordered list of [`ContentPart`]s; the dispatcher wraps it into
//! a single user [`Message`] after the system instruction and any chat history.

use serde::{Deserialize, Serialize};

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions
    System,
    /// The end user
    User,
    /// The model
    Assistant,
    /// Tool execution result
    Tool,
}

/// One piece of multi-part prompt content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn image_url(url: impl Into<String>) -> Self {
        Self::ImageUrl {
            image_url: ImageUrl { url: url.into() },
        }
    }
}

/// Message body: plain text or a list of content parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// Concatenated text of the content, ignoring non-text parts.
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Parts(parts) => parts
                .iter()
                .filter_map(|p| match p {
                    ContentPart::Text { text } => Some(text.as_str()),
                    ContentPart::ImageUrl { .. } => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

impl Default for MessageContent {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl From<&str> for MessageContent {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for MessageContent {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// A single turn in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Who sent this message
    pub role: Role,

    /// Text or multi-part content
    #[serde(default)]
    pub content: MessageContent,

    /// Tool calls requested by the assistant (if any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<MessageToolCall>,

    /// If this is a tool result, which tool call it responds to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    fn with_role(role: Role, content: MessageContent) -> Self {
        Self {
            role,
            content,
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<MessageContent>) -> Self {
        Self::with_role(Role::User, content.into())
    }

    /// Create a user message from ordered content parts.
    pub fn user_parts(parts: Vec<ContentPart>) -> Self {
        Self::with_role(Role::User, MessageContent::Parts(parts))
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<MessageContent>) -> Self {
        Self::with_role(Role::Assistant, content.into())
    }

    /// Create a new system message.
    pub fn system(content: impl Into<MessageContent>) -> Self {
        Self::with_role(Role::System, content.into())
    }

    /// Create a tool result message.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        let mut msg = Self::with_role(Role::Tool, MessageContent::Text(content.into()));
        msg.tool_call_id = Some(tool_call_id.into());
        msg
    }

    pub fn text(&self) -> String {
        self.content.as_text()
    }
}

/// A tool call embedded in an assistant message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageToolCall {
    /// Unique ID for this tool call
    #[serde(default)]
    pub id: String,

    /// Call kind; only `"function"` calls are executed
    #[serde(rename = "type", default = "default_call_kind")]
    pub kind: String,

    /// Name of the function to invoke
    pub name: String,

    /// Arguments as JSON string
    #[serde(default)]
    pub arguments: String,
}

fn default_call_kind() -> String {
    "function".into()
}

impl MessageToolCall {
    pub fn function(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: default_call_kind(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    pub fn is_function(&self) -> bool {
        self.kind == "function"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_message() {
        let msg = Message::user("Hello, model!");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.text(), "Hello, model!");
        assert!(msg.tool_calls.is_empty());
    }

    #[test]
    fn content_parts_serialize_tagged() {
        let msg = Message::user_parts(vec![
            ContentPart::text("Classify this"),
            ContentPart::image_url("https://example.com/a.png"),
        ]);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"][0]["type"], "text");
        assert_eq!(json["content"][1]["type"], "image_url");
        assert_eq!(json["content"][1]["image_url"]["url"], "https://example.com/a.png");
        assert_eq!(msg.text(), "Classify this");
    }

    #[test]
    fn history_turn_parses_from_role_and_content() {
        let msg: Message =
            serde_json::from_str(r#"{"role":"assistant","content":"Previous response"}"#).unwrap();
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.content, MessageContent::Text("Previous response".into()));
    }

    #[test]
    fn tool_call_kind_defaults_to_function() {
        let call: MessageToolCall =
            serde_json::from_str(r#"{"id":"call_1","name":"classify","arguments":"{}"}"#).unwrap();
        assert!(call.is_function());

        let other = MessageToolCall {
            kind: "code_interpreter".into(),
            ..MessageToolCall::function("call_2", "x", "{}")
        };
        assert!(!other.is_function());
    }

    #[test]
    fn tool_result_links_call_id() {
        let msg = Message::tool_result("call_9", "done");
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_9"));
    }
}

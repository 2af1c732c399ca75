//! Model-facing abstractions: a chat request goes in, either text or a
//! function call comes out.
//!
//! Concrete clients live in [`crate::clients`]; everything above this layer
//! (provider, dispatcher) only talks to [`LowLevelClient`].

use crate::error::AIError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

/// A function the model may decide to call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionSpec {
    pub name: String,
    pub description: String,
    /// JSON Schema of the arguments object.
    pub parameters: serde_json::Value,
}

/// One chat-completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    /// Overrides the client's configured temperature when set.
    pub temperature: Option<f32>,
    /// Ask the model to answer with a single JSON object.
    pub json_mode: bool,
    pub functions: Vec<FunctionSpec>,
}

impl ChatRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature: None,
            json_mode: false,
            functions: Vec::new(),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn json_object(mut self) -> Self {
        self.json_mode = true;
        self
    }

    pub fn with_functions(mut self, functions: Vec<FunctionSpec>) -> Self {
        self.functions = functions;
        self
    }

    /// Text of the last user message.
    pub fn user_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionCall {
    pub name: String,
    /// Raw JSON text of the arguments, exactly as the model produced it.
    pub arguments: String,
}

/// What the model answered with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatReply {
    Text(String),
    FunctionCall(FunctionCall),
}

impl ChatReply {
    /// The textual content of the reply; a function call yields its argument text.
    pub fn into_text(self) -> String {
        match self {
            ChatReply::Text(text) => text,
            ChatReply::FunctionCall(call) => call.arguments,
        }
    }
}

/// Low-level model client abstraction.
///
/// Implementors provide `chat`, which executes one request and returns the
/// model's reply. Parsing and validation happen in the layers above.
#[async_trait]
pub trait LowLevelClient: Send + Sync + Debug {
    async fn chat(&self, request: ChatRequest) -> Result<ChatReply, AIError>;

    /// Clone this client into a boxed trait object
    fn clone_box(&self) -> Box<dyn LowLevelClient>;
}

impl Clone for Box<dyn LowLevelClient> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

#[async_trait]
impl LowLevelClient for Box<dyn LowLevelClient> {
    async fn chat(&self, request: ChatRequest) -> Result<ChatReply, AIError> {
        self.as_ref().chat(request).await
    }

    fn clone_box(&self) -> Box<dyn LowLevelClient> {
        self.as_ref().clone_box()
    }
}

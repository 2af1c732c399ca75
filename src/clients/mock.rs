use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::core::{ChatReply, ChatRequest, FunctionCall, LowLevelClient};
use crate::error::AIError;

/// A scripted reply for [`MockClient`].
#[derive(Debug, Clone)]
pub enum MockResponse {
    Text(String),
    FunctionCall { name: String, arguments: String },
    Error(String),
}

impl MockResponse {
    pub fn function_call(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self::FunctionCall { name: name.into(), arguments: arguments.to_string() }
    }
}

/// Shared control over a [`MockClient`]: queue replies, inspect requests.
#[derive(Debug, Default)]
pub struct MockHandle {
    responses: Mutex<VecDeque<MockResponse>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockHandle {
    pub fn add_response(&self, response: MockResponse) {
        self.responses.lock().unwrap_or_else(|e| e.into_inner()).push_back(response);
    }

    /// Every request the client has received so far, oldest first.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn next(&self, request: ChatRequest) -> Option<MockResponse> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).push(request);
        self.responses.lock().unwrap_or_else(|e| e.into_inner()).pop_front()
    }
}

/// Mock client for testing that replays queued responses in order.
#[derive(Debug, Clone)]
pub struct MockClient {
    handle: Arc<MockHandle>,
}

impl MockClient {
    pub fn new() -> (Self, Arc<MockHandle>) {
        let handle = Arc::new(MockHandle::default());
        (Self { handle: handle.clone() }, handle)
    }

    pub fn with_responses(responses: Vec<MockResponse>) -> (Self, Arc<MockHandle>) {
        let (client, handle) = Self::new();
        for response in responses {
            handle.add_response(response);
        }
        (client, handle)
    }
}

#[async_trait]
impl LowLevelClient for MockClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatReply, AIError> {
        match self.handle.next(request) {
            Some(MockResponse::Text(text)) => Ok(ChatReply::Text(text)),
            Some(MockResponse::FunctionCall { name, arguments }) => {
                Ok(ChatReply::FunctionCall(FunctionCall { name, arguments }))
            }
            Some(MockResponse::Error(message)) => Err(AIError::Mock(message)),
            None => Err(AIError::Mock("no scripted response left".to_string())),
        }
    }

    fn clone_box(&self) -> Box<dyn LowLevelClient> {
        Box::new(self.clone())
    }
}

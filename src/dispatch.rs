//! Turning a free-text teacher request into either a reply or a quiz.
//!
//! The model decides whether the request calls for the `generate_quiz`
//! tool. Tool arguments are validated here before the provider is asked for
//! content.

use tracing::{info, instrument, warn};

use crate::core::{ChatReply, ChatRequest, LowLevelClient};
use crate::error::{QuizError, ValidationError};
use crate::provider::QuizProvider;
use crate::quiz::spec::{generate_quiz_function, GENERATE_QUIZ};
use crate::quiz::{Quiz, QuizSpec};

pub const ASSISTANT_SYSTEM_PROMPT: &str = "You are a teacher's assistant. \
If the user asks for a quiz, call generate_quiz. \
If information is missing, ask a clarifying question.";

/// Result of handling one request.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// The model answered in text, e.g. with a clarifying question.
    Reply(String),
    /// The model asked for a tool that does not exist.
    UnknownTool(String),
    /// A quiz was generated for the validated request.
    Quiz { spec: QuizSpec, quiz: Quiz },
}

impl DispatchOutcome {
    /// Message shown to the user for non-quiz outcomes.
    pub fn message(&self) -> Option<String> {
        match self {
            DispatchOutcome::Reply(text) => Some(text.clone()),
            DispatchOutcome::UnknownTool(name) => Some(format!("Tool not found: {name}")),
            DispatchOutcome::Quiz { .. } => None,
        }
    }
}

pub struct Dispatcher<C, P> {
    client: C,
    provider: P,
}

impl<C: LowLevelClient, P: QuizProvider> Dispatcher<C, P> {
    pub fn new(client: C, provider: P) -> Self {
        Self { client, provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Handle one request.
    ///
    /// Invalid tool arguments come back as [`QuizError::Validation`] without
    /// the provider being called.
    #[instrument(skip(self, user_text), fields(request_len = user_text.len()))]
    pub async fn handle(&self, user_text: &str) -> Result<DispatchOutcome, QuizError> {
        let request = ChatRequest::new(ASSISTANT_SYSTEM_PROMPT, user_text)
            .with_functions(vec![generate_quiz_function()])
            .with_temperature(0.0);

        let call = match self.client.chat(request).await? {
            ChatReply::Text(text) => return Ok(DispatchOutcome::Reply(text)),
            ChatReply::FunctionCall(call) => call,
        };

        if call.name != GENERATE_QUIZ {
            warn!(function = %call.name, "Model requested an unknown tool");
            return Ok(DispatchOutcome::UnknownTool(call.name));
        }

        let raw: serde_json::Value = serde_json::from_str(&call.arguments)
            .map_err(|e| ValidationError::new("arguments", format!("not valid JSON: {e}")))?;
        let spec = QuizSpec::validate(&raw)?;
        info!(topic = %spec.topic, grade_level = %spec.grade_level, num_questions = spec.num_questions, "Generating quiz");

        let quiz = self.provider.generate(&spec).await?;
        Ok(DispatchOutcome::Quiz { spec, quiz })
    }
}

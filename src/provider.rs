//! Quiz content providers: turn a validated [`QuizSpec`] into a [`Quiz`].

use async_trait::async_trait;
use schemars::schema_for;
use std::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::core::{ChatRequest, LowLevelClient};
use crate::error::QuizError;
use crate::quiz::{Quiz, QuizSpec};

const GENERATOR_SYSTEM_PROMPT: &str = "You are a strict quiz generator. Return ONLY valid JSON.";
const GENERATOR_TEMPERATURE: f32 = 0.2;

#[async_trait]
pub trait QuizProvider: Send + Sync {
    async fn generate(&self, spec: &QuizSpec) -> Result<Quiz, QuizError>;
}

/// Generates quizzes with a language model.
#[derive(Debug, Clone)]
pub struct LlmQuizProvider<C: LowLevelClient> {
    client: C,
}

impl<C: LowLevelClient> LlmQuizProvider<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// The request sent for `spec`: its parameters plus the quiz JSON schema.
    pub fn build_request(spec: &QuizSpec) -> ChatRequest {
        let schema = serde_json::to_string_pretty(&schema_for!(Quiz))
            .unwrap_or_else(|_| "Schema serialization failed".to_string());
        let user = format!(
            "Create a quiz.\n\
             topic: {}\n\
             grade_level: {}\n\
             num_questions: {}\n\
             question_type: {}\n\
             language: {}\n\n\
             Use \"mcq\" items with 2 or more options whose answer repeats one option verbatim, \
             and \"short\" items with a short free-text answer. \
             Number the items from 1.\n\n\
             ## Response Format\n\
             Return one JSON object matching this schema:\n```json\n{}\n```",
            spec.topic, spec.grade_level, spec.num_questions, spec.question_type, spec.language, schema
        );
        ChatRequest::new(GENERATOR_SYSTEM_PROMPT, user)
            .with_temperature(GENERATOR_TEMPERATURE)
            .json_object()
    }
}

#[async_trait]
impl<C: LowLevelClient> QuizProvider for LlmQuizProvider<C> {
    #[instrument(skip(self, spec), fields(topic = %spec.topic, num_questions = spec.num_questions))]
    async fn generate(&self, spec: &QuizSpec) -> Result<Quiz, QuizError> {
        let reply = self.client.chat(Self::build_request(spec)).await?;
        let quiz = Quiz::from_model_text(&reply.into_text())?;
        if quiz.items.len() != usize::from(spec.num_questions) {
            warn!(requested = spec.num_questions, returned = quiz.items.len(), "Question count differs from request");
        }
        info!(items = quiz.items.len(), "Quiz generated");
        Ok(quiz)
    }
}

/// Returns fixed quizzes and remembers the specs it was asked for.
#[derive(Debug, Default)]
pub struct CannedQuizProvider {
    quiz: Option<Quiz>,
    requests: Mutex<Vec<QuizSpec>>,
}

impl CannedQuizProvider {
    pub fn new(quiz: Quiz) -> Self {
        Self { quiz: Some(quiz), requests: Mutex::new(Vec::new()) }
    }

    /// A provider whose every call fails as malformed.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<QuizSpec> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl QuizProvider for CannedQuizProvider {
    async fn generate(&self, spec: &QuizSpec) -> Result<Quiz, QuizError> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).push(spec.clone());
        self.quiz
            .clone()
            .ok_or_else(|| QuizError::malformed("canned provider has no quiz"))
    }
}

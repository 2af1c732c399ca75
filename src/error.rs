use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuizError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Malformed quiz: {0}")]
    MalformedQuiz(String),
    #[error("AI error: {0}")]
    Ai(#[from] AIError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Input ended before the session was finished")]
    Interrupted,
}

impl QuizError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedQuiz(message.into())
    }
}

/// A quiz request parameter that failed validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid `{field}`: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self { field, message: message.into() }
    }
}

#[derive(Error, Debug)]
pub enum AIError {
    #[error("OpenAI API error: {0}")]
    OpenAI(#[from] OpenAIError),
    #[error("Mock error: {0}")]
    Mock(String),
}

#[derive(Error, Debug)]
pub enum OpenAIError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("API error: {0}")]
    Api(String),
    #[error("Rate limit exceeded")]
    RateLimit,
    #[error("Authentication failed")]
    Authentication,
}

pub mod clients;
pub mod config;
pub mod core;
pub mod dispatch;
pub mod error;
pub mod json_utils;
pub mod provider;
pub mod quiz;
pub mod report;
pub mod session;

// Convenient re-exports
pub use dispatch::{DispatchOutcome, Dispatcher};
pub use error::{QuizError, ValidationError};
pub use provider::{CannedQuizProvider, LlmQuizProvider, QuizProvider};
pub use quiz::{Quiz, QuizItem, QuizSpec};
pub use report::ReportStore;
pub use session::{SessionResult, SessionRunner};

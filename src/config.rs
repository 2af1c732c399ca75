use std::env;
use std::path::PathBuf;

use crate::clients::{OpenAIConfig, OpenAIModel};
use crate::error::QuizError;

pub const DEFAULT_SNAPSHOT_PATH: &str = "quiz.json";
pub const DEFAULT_REPORT_PATH: &str = "report.csv";

/// Trait for types that can retrieve their configuration key from environment variables
pub trait KeyFromEnv {
    /// The environment variable name for this client's API key
    const KEY_NAME: &'static str;

    /// Find the API key by checking environment variables first, then .env file
    fn find_key() -> Option<String> {
        // First try to load .env file (silently fail if not found)
        let _ = dotenvy::dotenv();

        env::var(Self::KEY_NAME).ok().filter(|key| !key.trim().is_empty())
    }

    /// Like [`KeyFromEnv::find_key`], but a missing key is a configuration error.
    fn require_key() -> Result<String, QuizError> {
        Self::find_key().ok_or_else(|| QuizError::Config(format!("{} is not set", Self::KEY_NAME)))
    }
}

/// Process-wide settings, built once at start-up and passed down explicitly.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub model: OpenAIModel,
    pub snapshot_path: PathBuf,
    pub report_path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: OpenAIModel::default(),
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_PATH),
            report_path: PathBuf::from(DEFAULT_REPORT_PATH),
        }
    }
}

impl AppConfig {
    /// Read `OPENAI_MODEL`, `QUIZ_SNAPSHOT_PATH` and `QUIZ_REPORT_PATH`
    /// (after loading `.env`), falling back to the defaults.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let defaults = Self::default();
        Self {
            model: env::var("OPENAI_MODEL")
                .map(|id| OpenAIModel::from_id(&id))
                .unwrap_or(defaults.model),
            snapshot_path: env::var("QUIZ_SNAPSHOT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.snapshot_path),
            report_path: env::var("QUIZ_REPORT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.report_path),
        }
    }

    /// Client settings for the configured model. Needs `api_key` from
    /// [`KeyFromEnv::require_key`]; only called when the model is contacted.
    pub fn openai_config(&self, api_key: String) -> OpenAIConfig {
        OpenAIConfig {
            api_key,
            model: self.model.clone(),
            ..OpenAIConfig::default()
        }
    }
}

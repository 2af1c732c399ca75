//! Parameters of a quiz request, validated before anything is sent to the
//! content provider.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::FunctionSpec;
use crate::error::ValidationError;

pub const MIN_QUESTIONS: u8 = 3;
pub const MAX_QUESTIONS: u8 = 20;

/// Name of the quiz generation tool offered to the model.
pub const GENERATE_QUIZ: &str = "generate_quiz";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GradeLevel {
    #[serde(rename = "K-3")]
    K3,
    #[serde(rename = "4-6")]
    G4To6,
    #[serde(rename = "7-9")]
    G7To9,
    #[serde(rename = "10-12")]
    G10To12,
}

impl GradeLevel {
    pub const ALL: [GradeLevel; 4] = [Self::K3, Self::G4To6, Self::G7To9, Self::G10To12];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::K3 => "K-3",
            Self::G4To6 => "4-6",
            Self::G7To9 => "7-9",
            Self::G10To12 => "10-12",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Mcq,
    Short,
    #[default]
    Mix,
}

impl QuestionType {
    pub const ALL: [QuestionType; 3] = [Self::Mcq, Self::Short, Self::Mix];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mcq => "mcq",
            Self::Short => "short",
            Self::Mix => "mix",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Ru,
    En,
}

impl Language {
    pub const ALL: [Language; 2] = [Self::Ru, Self::En];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ru => "ru",
            Self::En => "en",
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {$(
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    )*};
}

display_as_str!(GradeLevel, QuestionType, Language);

/// A validated quiz request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizSpec {
    pub topic: String,
    pub grade_level: GradeLevel,
    pub num_questions: u8,
    pub question_type: QuestionType,
    pub language: Language,
}

impl QuizSpec {
    /// Validate raw tool arguments into a spec.
    ///
    /// `question_type` and `language` fall back to their defaults when absent
    /// or null; every other problem names the offending field.
    pub fn validate(raw: &Value) -> Result<Self, ValidationError> {
        let args = raw
            .as_object()
            .ok_or_else(|| ValidationError::new("arguments", "expected a JSON object"))?;

        let topic = match args.get("topic") {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            Some(Value::String(_)) => return Err(ValidationError::new("topic", "must not be empty")),
            None | Some(Value::Null) => return Err(ValidationError::new("topic", "is required")),
            Some(other) => return Err(ValidationError::new("topic", format!("expected a string, got {other}"))),
        };

        let grade_level = match args.get("grade_level") {
            None | Some(Value::Null) => return Err(ValidationError::new("grade_level", "is required")),
            Some(value) => one_of("grade_level", value, &GradeLevel::ALL, GradeLevel::as_str)?,
        };

        let num_questions = match args.get("num_questions") {
            None | Some(Value::Null) => return Err(ValidationError::new("num_questions", "is required")),
            Some(value) => {
                let n = value
                    .as_i64()
                    .map(i128::from)
                    .or_else(|| value.as_u64().map(i128::from))
                    .ok_or_else(|| {
                        ValidationError::new("num_questions", format!("expected an integer, got {value}"))
                    })?;
                if !(i128::from(MIN_QUESTIONS)..=i128::from(MAX_QUESTIONS)).contains(&n) {
                    return Err(ValidationError::new(
                        "num_questions",
                        format!("{n} is outside {MIN_QUESTIONS}..={MAX_QUESTIONS}"),
                    ));
                }
                n as u8
            }
        };

        let question_type = match args.get("question_type") {
            None | Some(Value::Null) => QuestionType::default(),
            Some(value) => one_of("question_type", value, &QuestionType::ALL, QuestionType::as_str)?,
        };

        let language = match args.get("language") {
            None | Some(Value::Null) => Language::default(),
            Some(value) => one_of("language", value, &Language::ALL, Language::as_str)?,
        };

        Ok(Self { topic, grade_level, num_questions, question_type, language })
    }
}

fn one_of<T: Copy>(
    field: &'static str,
    value: &Value,
    choices: &[T],
    name: fn(&T) -> &'static str,
) -> Result<T, ValidationError> {
    let allowed = || choices.iter().map(name).collect::<Vec<_>>().join(", ");
    let s = value
        .as_str()
        .ok_or_else(|| ValidationError::new(field, format!("expected a string, got {value}")))?;
    choices
        .iter()
        .copied()
        .find(|choice| name(choice) == s)
        .ok_or_else(|| ValidationError::new(field, format!("`{s}` is not one of: {}", allowed())))
}

/// The `generate_quiz` tool definition offered to the model; mirrors the
/// constraints enforced by [`QuizSpec::validate`].
pub fn generate_quiz_function() -> FunctionSpec {
    fn names(all: &[&'static str]) -> Vec<Value> {
        all.iter().map(|s| Value::from(*s)).collect()
    }

    FunctionSpec {
        name: GENERATE_QUIZ.to_string(),
        description: "Generate a school quiz in JSON format".to_string(),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {
                "topic": {"type": "string"},
                "grade_level": {
                    "type": "string",
                    "enum": names(&GradeLevel::ALL.map(|g| g.as_str())),
                },
                "num_questions": {
                    "type": "integer",
                    "minimum": MIN_QUESTIONS,
                    "maximum": MAX_QUESTIONS,
                },
                "question_type": {
                    "type": "string",
                    "enum": names(&QuestionType::ALL.map(|t| t.as_str())),
                    "default": QuestionType::default().as_str(),
                },
                "language": {
                    "type": "string",
                    "enum": names(&Language::ALL.map(|l| l.as_str())),
                    "default": Language::default().as_str(),
                },
            },
            "required": ["topic", "grade_level", "num_questions"],
        }),
    }
}

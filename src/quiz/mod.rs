pub mod spec;

use std::collections::{BTreeMap, HashSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::QuizError;
use crate::json_utils::first_json_object;

pub use spec::{GradeLevel, Language, QuestionType, QuizSpec};

/// Answers by item id.
pub type AnswerKey = BTreeMap<u32, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// Multiple choice: `options` lists the choices, `answer` repeats one of them
    Mcq,
    /// Free-text answer
    Short,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct QuizItem {
    /// Positive id, unique within the quiz
    pub id: u32,
    /// Question text
    #[serde(rename = "q", alias = "question")]
    pub question: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    /// Choices for `mcq` items; absent for `short`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    /// Canonical answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

impl QuizItem {
    /// Options of an `mcq` item, or why the item cannot be presented.
    /// `None` for `short` items.
    pub fn mcq_options(&self) -> Result<Option<&[String]>, QuizError> {
        match (self.kind, self.options.as_deref()) {
            (ItemKind::Short, _) => Ok(None),
            (ItemKind::Mcq, Some(options)) if options.len() >= 2 => Ok(Some(options)),
            (ItemKind::Mcq, Some(options)) => Err(QuizError::malformed(format!(
                "mcq item {} has {} option(s), at least 2 are required",
                self.id,
                options.len()
            ))),
            (ItemKind::Mcq, None) => {
                Err(QuizError::malformed(format!("mcq item {} has no options", self.id)))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AnswerKeyEntry {
    pub id: u32,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Quiz {
    pub topic: String,
    pub grade_level: String,
    pub items: Vec<QuizItem>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "answer_key_serde")]
    #[schemars(with = "Option<Vec<AnswerKeyEntry>>")]
    pub answer_key: Option<AnswerKey>,
}

impl Quiz {
    /// Parse model output into a validated quiz. The first JSON object in
    /// `text` is used, so fenced or chatty output is accepted.
    pub fn from_model_text(text: &str) -> Result<Self, QuizError> {
        let json = first_json_object(text)
            .ok_or_else(|| QuizError::malformed("no JSON object found in provider output"))?;
        let quiz: Quiz = serde_json::from_str(json)
            .map_err(|e| QuizError::malformed(format!("does not match the quiz schema: {e}")))?;
        quiz.validate()?;
        debug!(topic = %quiz.topic, items = quiz.items.len(), "Parsed quiz");
        Ok(quiz)
    }

    /// Check the document-level invariants: at least one item, unique
    /// positive ids, answer-key ids that reference items, a canonical answer
    /// for every item and presentable options for every mcq item, one of
    /// which is its answer.
    pub fn validate(&self) -> Result<(), QuizError> {
        if self.items.is_empty() {
            return Err(QuizError::malformed("quiz has no items"));
        }

        let mut seen = HashSet::new();
        for item in &self.items {
            if item.id == 0 {
                return Err(QuizError::malformed("item ids must be positive"));
            }
            if !seen.insert(item.id) {
                return Err(QuizError::malformed(format!("duplicate item id {}", item.id)));
            }
        }

        if let Some(key) = &self.answer_key {
            if let Some(id) = key.keys().find(|id| !seen.contains(*id)) {
                return Err(QuizError::malformed(format!(
                    "answer_key references unknown item {id}"
                )));
            }
        }

        for item in &self.items {
            let options = item.mcq_options()?;
            let answer = self.canonical_answer(item)?;
            if options.is_some_and(|options| !options.iter().any(|option| option == answer)) {
                return Err(QuizError::malformed(format!(
                    "mcq item {} answer is not one of its options",
                    item.id
                )));
            }
        }
        Ok(())
    }

    /// The item's own `answer`, falling back to the answer key.
    pub fn canonical_answer<'a>(&'a self, item: &'a QuizItem) -> Result<&'a str, QuizError> {
        item.answer
            .as_deref()
            .or_else(|| self.answer_key.as_ref()?.get(&item.id).map(String::as_str))
            .ok_or_else(|| QuizError::malformed(format!("item {} has no answer", item.id)))
    }
}

/// `answer_key` is written as `[{"id": 1, "answer": "..."}]` and read from
/// either that list or an object keyed by id.
mod answer_key_serde {
    use super::{AnswerKey, AnswerKeyEntry};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        List(Vec<AnswerKeyEntry>),
        Map(BTreeMap<String, String>),
    }

    pub fn serialize<S: Serializer>(key: &Option<AnswerKey>, serializer: S) -> Result<S::Ok, S::Error> {
        key.as_ref()
            .map(|key| {
                key.iter()
                    .map(|(id, answer)| AnswerKeyEntry { id: *id, answer: answer.clone() })
                    .collect::<Vec<_>>()
            })
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<AnswerKey>, D::Error> {
        let repr = match Option::<Repr>::deserialize(deserializer)? {
            Some(repr) => repr,
            None => return Ok(None),
        };
        let mut key = AnswerKey::new();
        match repr {
            Repr::List(entries) => {
                for entry in entries {
                    if key.insert(entry.id, entry.answer).is_some() {
                        return Err(D::Error::custom(format!("answer_key lists item {} twice", entry.id)));
                    }
                }
            }
            Repr::Map(map) => {
                for (id, answer) in map {
                    let id: u32 = id
                        .trim()
                        .parse()
                        .map_err(|_| D::Error::custom(format!("answer_key id `{id}` is not an integer")))?;
                    if key.insert(id, answer).is_some() {
                        return Err(D::Error::custom(format!("answer_key lists item {id} twice")));
                    }
                }
            }
        }
        Ok(Some(key))
    }
}

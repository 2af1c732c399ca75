//! Locating JSON inside model output.
//!
//! Models asked for "only JSON" still wrap it in code fences or a sentence
//! now and then. The scanner below finds balanced top-level `{...}`/`[...]`
//! spans while skipping brackets inside string literals.

use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Object,
    Array,
}

/// Byte span of a top-level JSON structure; `end` is inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub kind: NodeType,
}

impl Span {
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..=self.end]
    }
}

/// Find all balanced top-level JSON structures in `text`, in order.
#[instrument(target = "quiz_assistant::json", skip(text), fields(text_len = text.len()))]
pub fn find_json_structures(text: &str) -> Vec<Span> {
    let mut results = Vec::new();
    let mut stack: Vec<(usize, NodeType)> = Vec::new();
    let mut in_string = false;
    let mut escape = false;

    for (i, &b) in text.as_bytes().iter().enumerate() {
        if in_string {
            if escape {
                escape = false;
                continue;
            }
            match b {
                b'\\' => escape = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }

        let closing = match b {
            b'"' if !stack.is_empty() => {
                in_string = true;
                None
            }
            b'{' => {
                stack.push((i, NodeType::Object));
                None
            }
            b'[' => {
                stack.push((i, NodeType::Array));
                None
            }
            b'}' => Some(NodeType::Object),
            b']' => Some(NodeType::Array),
            _ => None,
        };

        if let Some(kind) = closing {
            match stack.last() {
                Some(&(start, open)) if open == kind => {
                    stack.pop();
                    if stack.is_empty() {
                        results.push(Span { start, end: i, kind });
                    }
                }
                // Unbalanced closer: start over from a clean state
                Some(_) => stack.clear(),
                None => {}
            }
        }
    }

    debug!(target: "quiz_assistant::json", count = results.len(), "found root structures");
    results
}

/// The first top-level JSON object in `text`, if any.
pub fn first_json_object(text: &str) -> Option<&str> {
    find_json_structures(text)
        .into_iter()
        .find(|span| span.kind == NodeType::Object)
        .map(|span| span.slice(text))
}

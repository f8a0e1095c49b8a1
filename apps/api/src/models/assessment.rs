//! Assessment content — generated skills tests and interview questions.
//!
//! Generated content arrives as loosely-structured JSON from the LLM. It is
//! decoded here through a strict schema that fails closed: an unrecognized
//! question type or an unexpected field rejects the whole payload rather
//! than being duck-typed around.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssessmentError {
    #[error("assessment content is not a JSON array")]
    NotAnArray,

    #[error("question {index} has no \"type\" field")]
    MissingType { index: usize },

    #[error("question {index} has unrecognized type \"{kind}\"")]
    UnknownType { index: usize, kind: String },

    #[error("question {index} does not match the {kind} schema: {source}")]
    Shape {
        index: usize,
        kind: &'static str,
        source: serde_json::Error,
    },
}

/// A question answered with free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TextQuestion {
    pub id: String,
    pub prompt: String,
}

/// A question answered by picking one option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChoiceQuestion {
    pub id: String,
    pub prompt: String,
    pub options: Vec<String>,
}

/// A question answered by recording and uploading a video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VideoQuestion {
    pub id: String,
    pub prompt: String,
}

/// A single question in a skills test or interview set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssessmentQuestion {
    Text(TextQuestion),
    MultipleChoice(ChoiceQuestion),
    VideoUpload(VideoQuestion),
}

impl AssessmentQuestion {
    pub fn id(&self) -> &str {
        match self {
            AssessmentQuestion::Text(q) => &q.id,
            AssessmentQuestion::MultipleChoice(q) => &q.id,
            AssessmentQuestion::VideoUpload(q) => &q.id,
        }
    }

    pub fn prompt(&self) -> &str {
        match self {
            AssessmentQuestion::Text(q) => &q.prompt,
            AssessmentQuestion::MultipleChoice(q) => &q.prompt,
            AssessmentQuestion::VideoUpload(q) => &q.prompt,
        }
    }
}

/// Decodes a raw JSON string into questions, failing closed.
pub fn parse_questions(raw: &str) -> Result<Vec<AssessmentQuestion>, AssessmentError> {
    let value: Value = serde_json::from_str(raw).map_err(|_| AssessmentError::NotAnArray)?;
    let items = value.as_array().ok_or(AssessmentError::NotAnArray)?;

    let mut questions = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        questions.push(parse_question(index, item)?);
    }
    Ok(questions)
}

fn parse_question(index: usize, item: &Value) -> Result<AssessmentQuestion, AssessmentError> {
    let kind = item
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or(AssessmentError::MissingType { index })?
        .to_string();

    // Strip the discriminator so deny_unknown_fields applies to the payload.
    let mut payload = item.clone();
    if let Some(obj) = payload.as_object_mut() {
        obj.remove("type");
    }

    match kind.as_str() {
        "text" => serde_json::from_value::<TextQuestion>(payload)
            .map(AssessmentQuestion::Text)
            .map_err(|source| AssessmentError::Shape {
                index,
                kind: "text",
                source,
            }),
        "multiple_choice" => serde_json::from_value::<ChoiceQuestion>(payload)
            .map(AssessmentQuestion::MultipleChoice)
            .map_err(|source| AssessmentError::Shape {
                index,
                kind: "multiple_choice",
                source,
            }),
        "video_upload" => serde_json::from_value::<VideoQuestion>(payload)
            .map(AssessmentQuestion::VideoUpload)
            .map_err(|source| AssessmentError::Shape {
                index,
                kind: "video_upload",
                source,
            }),
        _ => Err(AssessmentError::UnknownType { index, kind }),
    }
}

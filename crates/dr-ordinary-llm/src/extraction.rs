//! Drug name extraction from agent replies and page text.

use std::collections::HashSet;

use dr_ordinary_core::content::{AcquisitionError, AcquisitionResult, WordSetProvider};
use dr_ordinary_core::highlight::{MatchPattern, WordSet};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Extraction errors.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid response format: {0}")]
    InvalidFormat(String),

    #[error("Letta API error: {status} - {status_text}")]
    Upstream { status: u16, status_text: String },

    #[error("Failed to call Letta API: {0}")]
    Transport(String),

    #[error("Agent not configured: {0}")]
    Config(String),
}

pub type ExtractionResult<T> = Result<T, ExtractionError>;

impl From<ExtractionError> for AcquisitionError {
    fn from(e: ExtractionError) -> Self {
        match e {
            ExtractionError::Transport(message) => AcquisitionError::Transport(message),
            ExtractionError::Upstream { status, status_text } => AcquisitionError::Upstream {
                status,
                message: status_text,
            },
            ExtractionError::Config(message) => AcquisitionError::Unconfigured(message),
            other => AcquisitionError::MalformedResponse(other.to_string()),
        }
    }
}

/// One entry of the agent's message list.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentMessage {
    #[serde(default)]
    pub message_type: String,
    #[serde(default)]
    pub content: Option<Value>,
}

impl AgentMessage {
    fn assistant_text(&self) -> Option<&str> {
        if self.message_type != "assistant_message" {
            return None;
        }
        self.content
            .as_ref()
            .and_then(Value::as_str)
            .filter(|text| !text.trim().is_empty())
    }
}

/// Parse an agent reply body into drug names.
///
/// The message list is read from a `messages` field or a top-level array. The
/// first assistant message with content must hold a JSON array of names or of
/// `{"drug": ...}` objects; surrounding prose is tolerated.
pub fn parse_agent_response(body: &str) -> ExtractionResult<Vec<String>> {
    let value: Value = serde_json::from_str(body)?;

    let messages = match value {
        Value::Array(messages) => Some(messages),
        Value::Object(mut fields) => match fields.remove("messages") {
            Some(Value::Array(messages)) => Some(messages),
            _ => None,
        },
        _ => None,
    }
    .ok_or_else(|| {
        ExtractionError::InvalidFormat("Could not find messages array in response".into())
    })?;

    let messages: Vec<AgentMessage> = messages
        .into_iter()
        .filter_map(|m| serde_json::from_value(m).ok())
        .collect();
    let content = messages
        .iter()
        .find_map(AgentMessage::assistant_text)
        .ok_or_else(|| {
            ExtractionError::InvalidFormat("Could not find valid assistant message content".into())
        })?;
    debug!(content, "Extracted assistant message content");

    let entries = parse_json_array(content)?;
    Ok(normalize_drug_entries(&entries))
}

/// Parse the JSON array in `content`, ignoring text around it.
pub fn parse_json_array(content: &str) -> ExtractionResult<Vec<Value>> {
    let slice = match (content.find('['), content.rfind(']')) {
        (Some(start), Some(end)) if start < end => &content[start..=end],
        _ => content.trim(),
    };

    match serde_json::from_str::<Value>(slice)? {
        Value::Array(entries) => Ok(entries),
        _ => Err(ExtractionError::InvalidFormat(
            "Final parsed content was not an array".into(),
        )),
    }
}

/// Keep non-empty strings and the non-empty `drug` field of objects.
pub fn normalize_drug_entries(entries: &[Value]) -> Vec<String> {
    entries
        .iter()
        .filter_map(|entry| match entry {
            Value::String(name) => Some(name.trim()),
            Value::Object(fields) => fields.get("drug").and_then(Value::as_str).map(str::trim),
            _ => None,
        })
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Common drug names recognized without the agent.
pub const COMMON_DRUG_KEYWORDS: &[&str] = &[
    "advil", "ibuprofen", "tylenol", "acetaminophen", "aspirin", "warfarin",
    "metformin", "lisinopril", "amlodipine", "atorvastatin", "levothyroxine",
    "omeprazole", "metoprolol", "losartan", "gabapentin", "sertraline",
    "trazodone", "prednisone", "tramadol", "hydrocodone", "oxycodone",
    "amoxicillin", "azithromycin", "ciprofloxacin", "doxycycline", "penicillin",
];

/// Offline extractor matching a fixed keyword list as whole words.
#[derive(Debug, Clone)]
pub struct KeywordExtractor {
    keywords: WordSet,
    pattern: Option<MatchPattern>,
}

impl KeywordExtractor {
    pub fn new() -> Self {
        Self::with_keywords(COMMON_DRUG_KEYWORDS.iter().copied())
    }

    /// Build from a custom keyword list. An empty list matches nothing.
    pub fn with_keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = WordSet::new(keywords);
        let pattern = MatchPattern::new(&keywords).ok();
        Self { keywords, pattern }
    }

    /// Keywords found in `content`, in keyword-list order.
    pub fn extract(&self, content: &str) -> Vec<String> {
        let Some(pattern) = &self.pattern else {
            return Vec::new();
        };
        let found: HashSet<String> = pattern
            .find_all(content)
            .into_iter()
            .map(|m| m.text.to_lowercase())
            .collect();
        self.keywords
            .iter()
            .filter(|k| found.contains(*k))
            .map(str::to_owned)
            .collect()
    }
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl WordSetProvider for KeywordExtractor {
    async fn candidate_words(&self, page_text: &str, _url: &str) -> AcquisitionResult<Vec<String>> {
        Ok(self.extract(page_text))
    }
}

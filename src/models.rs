use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_MODEL: &str = "grok-3";

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    /// Missing or empty messages are rejected by the service, not by the extractor.
    #[serde(default)]
    pub message: String,
    #[serde(default = "default_model", deserialize_with = "model_or_default")]
    pub model: String,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), model: default_model() }
    }
}

/// `"model": null` is treated the same as an absent field.
fn model_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_model))
}

/// Uniform envelope returned by `POST /api/chat` for every outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub success: bool,
    pub data: Option<Value>,
    pub error: Option<String>,
}

impl ChatResponse {
    pub fn success(data: Value) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self { success: false, data: None, error: Some(error.into()) }
    }

    pub fn failure_with_data(error: impl Into<String>, data: Value) -> Self {
        Self { success: false, data: Some(data), error: Some(error.into()) }
    }
}

/// Snapshot of one decode pass over the upstream stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateResult {
    pub text: String,
    pub response_id: Option<String>,
    pub conversation_id: Option<String>,
    /// Non-blank lines consumed, including skipped ones and the stop line.
    pub lines_processed: u64,
    pub malformed_lines: u64,
    pub unrecognized_lines: u64,
}

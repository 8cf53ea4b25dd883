//! Classification of single upstream lines into a closed set of events.
//!
//! The mirror mixes a nested `result.response.*` / `result.conversation.*`
//! layout with an older flat `result.*` layout, sometimes within one line.
//! Each line is parsed into typed frames first and only then mapped to
//! [`StreamEvent`]s, so the aggregator never inspects raw JSON.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// `result.conversation.conversationId`
    Conversation { conversation_id: String },
    /// `result.response.token` / `result.response.responseId`
    Token {
        token: Option<String>,
        response_id: Option<String>,
    },
    /// `result.response.modelResponse`: replaces whatever text was accumulated.
    FullMessage {
        message: Option<String>,
        response_id: Option<String>,
    },
    /// `result.response.isSoftStop == true`
    StopSignal,
    /// `result.token` / `result.conversationId` / `result.responseId`
    LegacyFlat {
        token: Option<String>,
        conversation_id: Option<String>,
        response_id: Option<String>,
    },
}

/// Outcome of classifying one raw line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedLine {
    Blank,
    Malformed(String),
    Unrecognized,
    /// Events in application order: response, then conversation, then legacy.
    Events(Vec<StreamEvent>),
}

// Every field goes through `lenient`, so a value of the wrong type drops only
// itself and its siblings are still seen.
#[derive(Debug, Deserialize)]
struct Frame {
    #[serde(default, deserialize_with = "lenient")]
    result: Option<ResultFrame>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultFrame {
    #[serde(default, deserialize_with = "lenient")]
    response: Option<ResponseFrame>,
    #[serde(default, deserialize_with = "lenient")]
    conversation: Option<ConversationFrame>,
    #[serde(default, deserialize_with = "lenient")]
    token: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    conversation_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    response_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseFrame {
    #[serde(default, deserialize_with = "lenient")]
    token: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    response_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    model_response: Option<ModelResponseFrame>,
    #[serde(default, deserialize_with = "lenient")]
    is_soft_stop: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelResponseFrame {
    #[serde(default, deserialize_with = "lenient")]
    message: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    response_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConversationFrame {
    #[serde(default, deserialize_with = "lenient")]
    conversation_id: Option<String>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Classifies one line of the upstream body (without its terminator).
pub fn decode_line(raw: &[u8]) -> DecodedLine {
    let text = match std::str::from_utf8(raw) {
        Ok(text) => text,
        Err(e) => return DecodedLine::Malformed(format!("invalid UTF-8: {e}")),
    };
    if text.trim().is_empty() {
        return DecodedLine::Blank;
    }

    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => return DecodedLine::Malformed(format!("invalid JSON: {e}")),
    };

    // Valid JSON that is not an object with a usable `result` is not
    // malformed, just not one of ours.
    let Ok(frame) = serde_json::from_value::<Frame>(value) else {
        return DecodedLine::Unrecognized;
    };
    let Some(result) = frame.result else {
        return DecodedLine::Unrecognized;
    };

    let events = classify(result);
    if events.is_empty() {
        DecodedLine::Unrecognized
    } else {
        DecodedLine::Events(events)
    }
}

fn classify(result: ResultFrame) -> Vec<StreamEvent> {
    let mut events = Vec::new();

    if let Some(response) = result.response {
        if response.token.is_some() || response.response_id.is_some() {
            events.push(StreamEvent::Token {
                token: response.token,
                response_id: response.response_id,
            });
        }
        if let Some(model_response) = response.model_response {
            events.push(StreamEvent::FullMessage {
                message: model_response.message,
                response_id: model_response.response_id,
            });
        }
        if response.is_soft_stop == Some(true) {
            events.push(StreamEvent::StopSignal);
        }
    }

    if let Some(conversation_id) = result.conversation.and_then(|c| c.conversation_id) {
        events.push(StreamEvent::Conversation { conversation_id });
    }

    if result.token.is_some() || result.conversation_id.is_some() || result.response_id.is_some() {
        events.push(StreamEvent::LegacyFlat {
            token: result.token,
            conversation_id: result.conversation_id,
            response_id: result.response_id,
        });
    }

    events
}

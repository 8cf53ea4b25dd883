use serde::Serialize;
use serde_json::{Map, Value};

/// Request body for `POST /rest/app-chat/conversations/new`.
///
/// Only `message`, `model_name` and `request_model_details.model_id` vary per
/// call; every other field is pinned to the value the web client sends.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamPayload {
    pub disable_memory: bool,
    pub disable_search: bool,
    pub disable_self_harm_short_circuit: bool,
    pub disable_text_follow_ups: bool,
    pub enable_image_generation: bool,
    pub enable_image_streaming: bool,
    pub enable_side_by_side: bool,
    pub file_attachments: Vec<Value>,
    pub force_concise: bool,
    pub force_side_by_side: bool,
    pub image_attachments: Vec<Value>,
    pub image_generation_count: u32,
    pub is_async_chat: bool,
    pub is_reasoning: bool,
    pub message: String,
    pub model_mode: &'static str,
    pub model_name: String,
    pub response_metadata: Map<String, Value>,
    pub model_config_override: Map<String, Value>,
    pub model_map: Map<String, Value>,
    pub request_model_details: RequestModelDetails,
    pub return_image_bytes: bool,
    pub return_raw_grok_in_xai_request: bool,
    pub send_final_metadata: bool,
    pub temporary: bool,
    pub tool_overrides: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestModelDetails {
    pub model_id: String,
}

pub fn build(message: &str, model: &str) -> UpstreamPayload {
    UpstreamPayload {
        disable_memory: false,
        disable_search: false,
        disable_self_harm_short_circuit: false,
        disable_text_follow_ups: false,
        enable_image_generation: true,
        enable_image_streaming: true,
        enable_side_by_side: true,
        file_attachments: Vec::new(),
        force_concise: false,
        force_side_by_side: false,
        image_attachments: Vec::new(),
        image_generation_count: 2,
        is_async_chat: false,
        is_reasoning: false,
        message: message.to_string(),
        model_mode: "MODEL_MODE_AUTO",
        model_name: model.to_string(),
        response_metadata: Map::new(),
        model_config_override: Map::new(),
        model_map: Map::new(),
        request_model_details: RequestModelDetails { model_id: model.to_string() },
        return_image_bytes: false,
        return_raw_grok_in_xai_request: false,
        send_final_metadata: true,
        temporary: false,
        tool_overrides: Map::new(),
    }
}

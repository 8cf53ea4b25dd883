use serde_json::json;
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::models::{AggregateResult, ChatRequest, ChatResponse};
use crate::stream::StreamDecoder;
use crate::upstream::{payload, UpstreamClient};

const EMPTY_EXTRACTION_ERROR: &str = "No response text extracted";
const EMPTY_EXTRACTION_HINT: &str = "Check the service logs for the first upstream lines";

/// Relays one chat message per call. Holds no per-call state; every call
/// builds its own payload, connection and decoder.
#[derive(Clone)]
pub struct ChatService {
    upstream: UpstreamClient,
}

impl ChatService {
    pub fn new(upstream: UpstreamClient) -> Self {
        Self { upstream }
    }

    /// Runs a call to completion and always produces an envelope.
    pub async fn relay(&self, request: ChatRequest) -> ChatResponse {
        match self.chat(request).await {
            Ok(response) => response,
            Err(err) => {
                if err.is_validation() {
                    warn!("rejected chat request: {err}");
                } else if err.is_timeout() {
                    error!("upstream request timed out");
                } else {
                    error!("chat relay failed: {err}");
                }
                err.into_envelope()
            }
        }
    }

    /// validating → dispatching → decoding → done.
    /// An empty extraction is reported as data rather than as an error.
    pub async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, AppError> {
        // ── Validation ────────────────────────────────────────────────────────
        if request.message.trim().is_empty() {
            return Err(AppError::MissingField { field_name: "Message" });
        }
        info!(model = %request.model, chars = request.message.chars().count(), "received chat request");

        // ── Dispatch ──────────────────────────────────────────────────────────
        let body = payload::build(&request.message, &request.model);
        let response = self.upstream.open_stream(&body).await?;

        // ── Decode ────────────────────────────────────────────────────────────
        let result = StreamDecoder::new().run(response.bytes_stream()).await?;

        Ok(into_envelope(result))
    }
}

fn into_envelope(result: AggregateResult) -> ChatResponse {
    if result.text.is_empty() {
        warn!(
            lines = result.lines_processed,
            malformed = result.malformed_lines,
            "upstream stream produced no text"
        );
        return ChatResponse::failure_with_data(
            EMPTY_EXTRACTION_ERROR,
            json!({
                "debug_info": {
                    "lines_processed": result.lines_processed,
                    "malformed_lines": result.malformed_lines,
                    "unrecognized_lines": result.unrecognized_lines,
                    "response_id": result.response_id,
                    "conversation_id": result.conversation_id,
                    "hint": EMPTY_EXTRACTION_HINT,
                }
            }),
        );
    }

    ChatResponse::success(json!({
        "response": result.text,
        "conversation_id": result.conversation_id,
        "response_id": result.response_id,
    }))
}

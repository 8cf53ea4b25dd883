use std::ops::ControlFlow;

use crate::models::AggregateResult;
use crate::stream::event::StreamEvent;

/// Accumulation state for exactly one decode pass.
#[derive(Debug, Default)]
pub struct ResponseAggregator {
    text: String,
    response_id: Option<String>,
    conversation_id: Option<String>,
    lines_processed: u64,
    malformed_lines: u64,
    unrecognized_lines: u64,
}

impl ResponseAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_token(&mut self, fragment: &str) {
        self.text.push_str(fragment);
    }

    pub fn on_full_message(&mut self, text: String, response_id: Option<String>) {
        self.text = text;
        if let Some(id) = response_id {
            self.response_id = Some(id);
        }
    }

    pub fn on_response_id(&mut self, id: String) {
        self.response_id = Some(id);
    }

    pub fn on_conversation_id(&mut self, id: String) {
        self.conversation_id = Some(id);
    }

    pub fn on_line_processed(&mut self) {
        self.lines_processed += 1;
    }

    pub fn on_malformed_line(&mut self) {
        self.malformed_lines += 1;
    }

    pub fn on_unrecognized_line(&mut self) {
        self.unrecognized_lines += 1;
    }

    /// Applies one event; `Break` means the stream is logically complete.
    pub fn apply(&mut self, event: StreamEvent) -> ControlFlow<()> {
        match event {
            StreamEvent::Token { token, response_id } => {
                if let Some(token) = token {
                    self.on_token(&token);
                }
                if let Some(id) = response_id {
                    self.on_response_id(id);
                }
            }
            StreamEvent::FullMessage { message, response_id } => match message {
                Some(message) => self.on_full_message(message, response_id),
                None => {
                    if let Some(id) = response_id {
                        self.on_response_id(id);
                    }
                }
            },
            StreamEvent::StopSignal => return ControlFlow::Break(()),
            StreamEvent::Conversation { conversation_id } => self.on_conversation_id(conversation_id),
            StreamEvent::LegacyFlat { token, conversation_id, response_id } => {
                if let Some(token) = token {
                    self.on_token(&token);
                }
                if let Some(id) = conversation_id {
                    self.on_conversation_id(id);
                }
                if let Some(id) = response_id {
                    self.on_response_id(id);
                }
            }
        }
        ControlFlow::Continue(())
    }

    #[cfg(test)]
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn lines_processed(&self) -> u64 {
        self.lines_processed
    }

    pub fn finalize(&self) -> AggregateResult {
        AggregateResult {
            text: self.text.clone(),
            response_id: self.response_id.clone(),
            conversation_id: self.conversation_id.clone(),
            lines_processed: self.lines_processed,
            malformed_lines: self.malformed_lines,
            unrecognized_lines: self.unrecognized_lines,
        }
    }
}

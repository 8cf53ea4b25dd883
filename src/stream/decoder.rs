use std::ops::ControlFlow;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::models::AggregateResult;
use crate::stream::aggregator::ResponseAggregator;
use crate::stream::event::{decode_line, DecodedLine};

/// How many leading lines are echoed to the debug log.
const LOGGED_LINES: u64 = 5;
const LOGGED_LINE_CHARS: usize = 200;
/// Longest line buffered while waiting for its terminator.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// Splits an upstream body into lines and drives a [`ResponseAggregator`].
///
/// Chunks may end anywhere, including in the middle of a UTF-8 sequence, so
/// bytes are buffered until a `\n` arrives. A line longer than
/// [`MAX_LINE_BYTES`] is counted as malformed and dropped up to its
/// terminator. Once a stop signal is seen the decoder refuses further input.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    aggregator: ResponseAggregator,
    pending: Vec<u8>,
    /// Prefix of `pending` already known to hold no `\n`.
    scanned: usize,
    /// Inside an oversized line; bytes are dropped until the next `\n`.
    overflowed: bool,
    stopped: bool,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Decodes one complete line (terminator already removed).
    pub fn feed_line(&mut self, raw: &[u8]) -> ControlFlow<()> {
        if self.stopped {
            return ControlFlow::Break(());
        }

        let decoded = decode_line(raw);
        if decoded == DecodedLine::Blank {
            return ControlFlow::Continue(());
        }

        self.aggregator.on_line_processed();
        let line_no = self.aggregator.lines_processed();
        if line_no <= LOGGED_LINES {
            let excerpt: String = String::from_utf8_lossy(raw).chars().take(LOGGED_LINE_CHARS).collect();
            debug!(line = line_no, "{excerpt}");
        }

        match decoded {
            DecodedLine::Blank => {}
            DecodedLine::Malformed(reason) => {
                warn!(line = line_no, "skipping malformed line: {reason}");
                self.aggregator.on_malformed_line();
            }
            DecodedLine::Unrecognized => {
                debug!(line = line_no, "skipping unrecognized line");
                self.aggregator.on_unrecognized_line();
            }
            DecodedLine::Events(events) => {
                for event in events {
                    if self.aggregator.apply(event).is_break() {
                        info!(line = line_no, "received soft stop");
                        self.stopped = true;
                        self.pending.clear();
                        self.scanned = 0;
                        return ControlFlow::Break(());
                    }
                }
            }
        }
        ControlFlow::Continue(())
    }

    /// Buffers a raw body chunk and decodes every line it completes.
    pub fn feed_chunk(&mut self, chunk: &[u8]) -> ControlFlow<()> {
        if self.stopped {
            return ControlFlow::Break(());
        }

        let mut buffer = std::mem::take(&mut self.pending);
        buffer.extend_from_slice(chunk);

        let mut start = 0;
        let mut search_from = self.scanned;
        while let Some(offset) = buffer[search_from..].iter().position(|b| *b == b'\n') {
            let end = search_from + offset;
            if self.overflowed {
                self.overflowed = false;
            } else if self.feed_line(trim_cr(&buffer[start..end])).is_break() {
                return ControlFlow::Break(());
            }
            start = end + 1;
            search_from = start;
        }

        buffer.drain(..start);
        if buffer.len() > MAX_LINE_BYTES {
            if !self.overflowed {
                self.overflowed = true;
                self.skip_oversized_line();
            }
            buffer.clear();
        }
        self.scanned = buffer.len();
        self.pending = buffer;
        ControlFlow::Continue(())
    }

    fn skip_oversized_line(&mut self) {
        self.aggregator.on_line_processed();
        self.aggregator.on_malformed_line();
        warn!(
            line = self.aggregator.lines_processed(),
            "skipping line longer than {MAX_LINE_BYTES} bytes"
        );
    }

    /// Decodes a trailing line that arrived without a terminator.
    pub fn flush(&mut self) -> ControlFlow<()> {
        let rest = std::mem::take(&mut self.pending);
        self.scanned = 0;
        if std::mem::take(&mut self.overflowed) || rest.is_empty() {
            return ControlFlow::Continue(());
        }
        self.feed_line(trim_cr(&rest))
    }

    pub fn snapshot(&self) -> AggregateResult {
        self.aggregator.finalize()
    }

    /// Consumes the body until a stop signal or end of stream.
    ///
    /// Returning early drops `body`, which closes the upstream connection.
    /// A read error yields [`AppError::StreamDecode`] carrying everything
    /// aggregated up to that point.
    pub async fn run<S, E>(mut self, body: S) -> Result<AggregateResult, AppError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: std::fmt::Display,
    {
        let mut body = std::pin::pin!(body);

        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| AppError::StreamDecode {
                message: e.to_string(),
                partial: self.snapshot(),
            })?;
            if self.feed_chunk(&chunk).is_break() {
                break;
            }
        }
        if !self.stopped {
            let _ = self.flush();
        }

        let result = self.snapshot();
        info!(
            lines = result.lines_processed,
            malformed = result.malformed_lines,
            unrecognized = result.unrecognized_lines,
            text_len = result.text.len(),
            "stream decoding completed"
        );
        Ok(result)
    }
}

fn trim_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Decodes a fixed sequence of lines with a fresh decoder.
pub fn decode_lines<'a, I>(lines: I) -> AggregateResult
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut decoder = StreamDecoder::new();
    for line in lines {
        if decoder.feed_line(line).is_break() {
            break;
        }
    }
    decoder.snapshot()
}

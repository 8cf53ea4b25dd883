pub mod aggregator;
pub mod decoder;
pub mod event;

pub use aggregator::ResponseAggregator;
pub use decoder::{decode_lines, StreamDecoder};
pub use event::{decode_line, DecodedLine, StreamEvent};

pub mod client;
pub mod payload;

pub use client::UpstreamClient;
pub use payload::UpstreamPayload;

//! Relay from a simple JSON chat API to a Grok web mirror.
//!
//! The interesting part lives in [`stream`]: the mirror answers with a
//! line-delimited JSON stream mixing several layouts, which is decoded into a
//! single answer plus the conversation and response identifiers.

pub mod config;
pub mod errors;
pub mod models;
pub mod routes;
pub mod service;
pub mod stream;
pub mod upstream;

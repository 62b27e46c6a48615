//! Chat service client.
//!
//! Speaks the `POST {base}/chat` protocol: a message list, an optional tool
//! schema and a `stream` flag. Non-streaming calls answer with one JSON
//! document; streaming calls answer with newline-delimited JSON.

pub mod chat;

pub use chat::ChatClient;

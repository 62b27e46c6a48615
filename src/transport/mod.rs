//! HTTP transport shared by the chat client and the execution dispatcher.

pub mod http;

pub use http::{HttpTransport, PoolSettings, TransportError};

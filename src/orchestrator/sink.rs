use crate::{Error, Result};
use bytes::Bytes;
use std::io;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Items carried to the HTTP response body.
pub type RelayItem = std::result::Result<Bytes, io::Error>;

/// Write half of a streaming response.
///
/// Every write is handed to the response body immediately. When the last
/// sink is dropped the body ends. A failed write means the client is gone.
#[derive(Debug, Clone)]
pub struct RelaySink {
    tx: mpsc::Sender<RelayItem>,
}

impl RelaySink {
    /// A sink plus the stream to mount as the response body.
    pub fn channel(capacity: usize) -> (Self, ReceiverStream<RelayItem>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, ReceiverStream::new(rx))
    }

    pub async fn send(&self, bytes: impl Into<Bytes>) -> Result<()> {
        self.tx
            .send(Ok(bytes.into()))
            .await
            .map_err(|_| Error::ClientDisconnected)
    }

    /// Send `line` followed by a newline.
    pub async fn send_line(&self, line: &str) -> Result<()> {
        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');
        self.send(buf).await
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

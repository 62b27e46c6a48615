//! Streaming body readers (transport chunks -> UTF-8 text fragments)
//!
//! A response body reaches the bridge in one of three shapes: a pull-based
//! reader, a pushed sequence of byte chunks, or a future that only yields the
//! whole body as text. [`BodySource`] tags the shape once per response and
//! [`FragmentReader`] hides it behind [`FragmentSource`] for the rest of the
//! pipeline.

use crate::pipeline::FragmentSource;
use crate::transport::TransportError;
use crate::{BoxStream, Error, Result};
use bytes::Bytes;
use futures::future::BoxFuture;
use futures::{stream, StreamExt, TryStreamExt};
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;

/// The concrete shape of a response body.
pub enum BodySource {
    /// Pull-based reader; each read fills one chunk until EOF.
    Reader(ReaderStream<Box<dyn AsyncRead + Send + Unpin>>),
    /// Pushed sequence of raw chunks.
    Chunks(BoxStream<'static, Bytes>),
    /// Only "read everything as text" is available; yields a single fragment.
    Whole(Option<BoxFuture<'static, Result<String>>>),
}

impl BodySource {
    pub fn reader<R>(reader: R) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let reader: Box<dyn AsyncRead + Send + Unpin> = Box::new(reader);
        BodySource::Reader(ReaderStream::new(reader))
    }

    pub fn chunks(chunks: BoxStream<'static, Bytes>) -> Self {
        BodySource::Chunks(chunks)
    }

    pub fn whole<F>(text: F) -> Self
    where
        F: std::future::Future<Output = Result<String>> + Send + 'static,
    {
        BodySource::Whole(Some(Box::pin(text)))
    }

    /// Stream a `reqwest` response body chunk by chunk.
    pub fn from_response(response: reqwest::Response) -> Self {
        let byte_stream = response
            .bytes_stream()
            .map_err(|e| Error::Transport(TransportError::Http(e)));
        BodySource::Chunks(Box::pin(byte_stream))
    }

    fn kind(&self) -> &'static str {
        match self {
            BodySource::Reader(_) => "reader",
            BodySource::Chunks(_) => "chunks",
            BodySource::Whole(_) => "whole",
        }
    }
}

impl std::fmt::Debug for BodySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("BodySource").field(&self.kind()).finish()
    }
}

/// Incremental UTF-8 decoder.
///
/// Code points split across chunk boundaries are held back until the rest of
/// their bytes arrive. Invalid sequences decode to U+FFFD, and an incomplete
/// tail left at end of stream is flushed lossily by [`Utf8Decoder::finish`].
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decode(&mut self, bytes: &[u8]) -> String {
        let input = if self.pending.is_empty() {
            bytes.to_vec()
        } else {
            let mut joined = std::mem::take(&mut self.pending);
            joined.extend_from_slice(bytes);
            joined
        };

        let mut out = String::with_capacity(input.len());
        let mut rest: &[u8] = &input;
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(e) => {
                    let (valid, tail) = rest.split_at(e.valid_up_to());
                    out.push_str(&String::from_utf8_lossy(valid));
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &tail[len..];
                        }
                        None => {
                            // Incomplete sequence at the end: wait for more bytes.
                            self.pending = tail.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }
        let tail = std::mem::take(&mut self.pending);
        String::from_utf8_lossy(&tail).into_owned()
    }
}

/// Lazy, finite, non-restartable sequence of decoded text fragments.
///
/// Fragments follow transport chunk boundaries, not line boundaries.
#[derive(Debug)]
pub struct FragmentReader {
    source: BodySource,
    decoder: Utf8Decoder,
    finished: bool,
}

impl FragmentReader {
    pub fn new(source: BodySource) -> Self {
        Self {
            source,
            decoder: Utf8Decoder::new(),
            finished: false,
        }
    }

    async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        match &mut self.source {
            BodySource::Reader(reader) => Ok(reader.next().await.transpose()?),
            BodySource::Chunks(chunks) => chunks.next().await.transpose(),
            BodySource::Whole(_) => Ok(None),
        }
    }

    /// Adapt into a `Stream` of fragments.
    pub fn into_stream(self) -> BoxStream<'static, String> {
        let stream = stream::unfold(self, |mut reader| async move {
            match reader.next_fragment().await {
                Ok(Some(fragment)) => Some((Ok(fragment), reader)),
                Ok(None) => None,
                Err(e) => {
                    reader.finished = true;
                    Some((Err(e), reader))
                }
            }
        });
        Box::pin(stream)
    }
}

#[async_trait::async_trait]
impl FragmentSource for FragmentReader {
    async fn next_fragment(&mut self) -> Result<Option<String>> {
        if self.finished {
            return Ok(None);
        }

        if let BodySource::Whole(pending) = &mut self.source {
            self.finished = true;
            return match pending.take() {
                Some(text) => text.await.map(Some),
                None => Ok(None),
            };
        }

        loop {
            match self.next_chunk().await? {
                Some(bytes) => {
                    let text = self.decoder.decode(&bytes);
                    if text.is_empty() {
                        // Chunk held only part of a code point (or nothing).
                        continue;
                    }
                    return Ok(Some(text));
                }
                None => {
                    self.finished = true;
                    let tail = self.decoder.finish();
                    return Ok(if tail.is_empty() { None } else { Some(tail) });
                }
            }
        }
    }
}
